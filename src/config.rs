//! Configuration for the Anki + Ollama flashcard tool.
//!
//! Read once at startup: built-in defaults, then an optional TOML file, then
//! `ANTOR_*` environment variables. Never mutated afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::CardStyle;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings shared by the CLI and the interactive UI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// AnkiConnect endpoint (Anki must be running with the add-on enabled)
    pub anki_url: String,
    pub anki_api_version: u32,
    /// Deck that receives new notes unless another one is chosen
    pub deck_name: String,
    /// Note type; must have the front and back fields below
    pub note_type: String,
    pub front_field: String,
    pub back_field: String,
    /// Tags attached to every note added
    pub tags: Vec<String>,

    /// Ollama endpoint and model
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_timeout_secs: u64,

    /// Cards requested per run
    pub cards_per_run: usize,
    /// Default card style when none is given
    pub card_style: CardStyle,
    /// Max transcript/article characters sent to the model (avoids context overflow)
    pub max_transcript_chars: usize,
    /// Preferred caption language
    pub transcript_language: String,

    /// Timeout for page and transcript fetches
    pub request_timeout_secs: u64,
    pub store_timeout_secs: u64,
    /// Sync can take a minute or more depending on the connection
    pub sync_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            anki_url: "http://127.0.0.1:8765".to_string(),
            anki_api_version: 6,
            deck_name: "LLM Flashcards".to_string(),
            note_type: "Basic".to_string(),
            front_field: "Front".to_string(),
            back_field: "Back".to_string(),
            tags: vec!["antor".to_string()],
            ollama_url: "http://127.0.0.1:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            ollama_timeout_secs: 120,
            cards_per_run: 5,
            card_style: CardStyle::Basic,
            max_transcript_chars: 12_000,
            transcript_language: "en".to_string(),
            request_timeout_secs: 30,
            store_timeout_secs: 10,
            sync_timeout_secs: 120,
        }
    }
}

impl AppConfig {
    /// Default config file location (`~/.config/antor/config.toml` on Linux)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("antor").join("config.toml"))
    }

    /// Load configuration: explicit path, else the default path if it exists,
    /// else built-in defaults. Environment overrides apply in every case.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `ANTOR_<KEY>` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&format!("ANTOR_{}", key.to_uppercase()));

        if let Some(v) = get("anki_url") {
            self.anki_url = v;
        }
        if let Some(v) = get("anki_api_version") {
            self.anki_api_version = parse_number("anki_api_version", &v)?;
        }
        if let Some(v) = get("deck_name") {
            self.deck_name = v;
        }
        if let Some(v) = get("note_type") {
            self.note_type = v;
        }
        if let Some(v) = get("front_field") {
            self.front_field = v;
        }
        if let Some(v) = get("back_field") {
            self.back_field = v;
        }
        if let Some(v) = get("tags") {
            self.tags = v
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(v) = get("ollama_url") {
            self.ollama_url = v;
        }
        if let Some(v) = get("ollama_model") {
            self.ollama_model = v;
        }
        if let Some(v) = get("ollama_timeout_secs") {
            self.ollama_timeout_secs = parse_number("ollama_timeout_secs", &v)?;
        }
        if let Some(v) = get("cards_per_run") {
            self.cards_per_run = parse_number("cards_per_run", &v)?;
        }
        if let Some(v) = get("card_style") {
            self.card_style = v.parse().map_err(|message| ConfigError::Invalid {
                key: "card_style".to_string(),
                message,
            })?;
        }
        if let Some(v) = get("max_transcript_chars") {
            self.max_transcript_chars = parse_number("max_transcript_chars", &v)?;
        }
        if let Some(v) = get("transcript_language") {
            self.transcript_language = v;
        }
        if let Some(v) = get("request_timeout_secs") {
            self.request_timeout_secs = parse_number("request_timeout_secs", &v)?;
        }
        if let Some(v) = get("store_timeout_secs") {
            self.store_timeout_secs = parse_number("store_timeout_secs", &v)?;
        }
        if let Some(v) = get("sync_timeout_secs") {
            self.sync_timeout_secs = parse_number("sync_timeout_secs", &v)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cards_per_run == 0 {
            return Err(invalid("cards_per_run", "must be at least 1"));
        }
        if self.max_transcript_chars == 0 {
            return Err(invalid("max_transcript_chars", "must be at least 1"));
        }
        for (key, url) in [("anki_url", &self.anki_url), ("ollama_url", &self.ollama_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(invalid(key, "URL must start with http:// or https://"));
            }
        }
        if self.deck_name.trim().is_empty() {
            return Err(invalid("deck_name", "must not be empty"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ollama_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, &format!("'{}' is not a valid number", value)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cards_per_run, 5);
        assert_eq!(config.max_transcript_chars, 12_000);
        assert_eq!(config.deck_name, "LLM Flashcards");
    }

    #[test]
    fn test_from_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deck_name = \"Biology\"\ncards_per_run = 8\ncard_style = \"eli5\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.deck_name, "Biology");
        assert_eq!(config.cards_per_run, 8);
        assert_eq!(config.card_style, CardStyle::Eli5);
        assert_eq!(config.ollama_model, "llama3.2");
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cards_per_run = \"many\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ANTOR_OLLAMA_MODEL", "qwen2.5"),
            ("ANTOR_CARDS_PER_RUN", "3"),
            ("ANTOR_TAGS", "bio, exam ,"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.ollama_model, "qwen2.5");
        assert_eq!(config.cards_per_run, 3);
        assert_eq!(config.tags, vec!["bio".to_string(), "exam".to_string()]);
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == "ANTOR_MAX_TRANSCRIPT_CHARS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("max_transcript_chars"));
    }

    #[test]
    fn test_validate_rejects_zero_count_and_bad_url() {
        let mut config = AppConfig::default();
        config.cards_per_run = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.anki_url = "127.0.0.1:8765".to_string();
        assert!(config.validate().is_err());
    }
}
