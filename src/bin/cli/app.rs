use std::path::Path;

use anyhow::{Context, Result};

use antor_lib::config::AppConfig;
use antor_lib::generation::OllamaClient;
use antor_lib::store::AnkiConnectClient;
use antor_lib::ServicePipeline;

/// Shared application state for CLI commands and the TUI
pub struct App {
    pub config: AppConfig,
    pub pipeline: ServicePipeline,
}

impl App {
    /// Load configuration and build the service clients
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load configuration")?;
        log::debug!("Using Anki at {} and Ollama model {}", config.anki_url, config.ollama_model);

        let pipeline =
            ServicePipeline::from_config(&config).context("Failed to create HTTP clients")?;

        Ok(Self { config, pipeline })
    }

    /// The requested deck, or the configured default when none (or a blank one) is given
    pub fn deck(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(self.config.deck_name.as_str())
            .to_string()
    }

    pub fn store(&self) -> &AnkiConnectClient {
        self.pipeline.store()
    }

    pub fn ollama(&self) -> &OllamaClient {
        self.pipeline.generator()
    }
}
