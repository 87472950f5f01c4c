use std::collections::{BTreeMap, HashSet};

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::errors::{Result, StoreError};
use super::models::{AddOutcome, AnkiRequest, AnkiResponse, NoteInfo, NoteOptions, NoteRecord};
use crate::cards::{normalize_front, Card};
use crate::config::AppConfig;

/// AnkiConnect client. Anki must be running with the AnkiConnect add-on.
pub struct AnkiConnectClient {
    client: Client,
    sync_client: Client,
    url: String,
    version: u32,
    note_type: String,
    front_field: String,
    back_field: String,
    tags: Vec<String>,
}

impl AnkiConnectClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.store_timeout()).build()?;
        // Sync can take a minute or more
        let sync_client = Client::builder().timeout(config.sync_timeout()).build()?;

        Ok(Self {
            client,
            sync_client,
            url: config.anki_url.clone(),
            version: config.anki_api_version,
            note_type: config.note_type.clone(),
            front_field: config.front_field.clone(),
            back_field: config.back_field.clone(),
            tags: config.tags.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one action and return the raw envelope.
    fn call(&self, client: &Client, action: &str, params: Value) -> Result<AnkiResponse> {
        let request = AnkiRequest {
            action,
            version: self.version,
            params,
        };
        log::debug!("AnkiConnect {}", action);

        let response = client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("HTTP {}", status)));
        }

        response
            .json::<AnkiResponse>()
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    /// Send one action and decode its result, failing on any envelope error.
    fn invoke<T: DeserializeOwned>(&self, action: &str, params: Value) -> Result<T> {
        let response = self.call(&self.client, action, params)?;
        if let Some(message) = error_message(&response.error) {
            return Err(StoreError::Api(message));
        }
        serde_json::from_value(response.result)
            .map_err(|e| StoreError::InvalidResponse(format!("{}: {}", action, e)))
    }

    fn unavailable(&self, message: impl ToString) -> StoreError {
        StoreError::Unavailable {
            url: self.url.clone(),
            message: message.to_string(),
        }
    }

    /// AnkiConnect API version
    pub fn version(&self) -> Result<u32> {
        self.invoke("version", json!({}))
    }

    /// Connectivity check; never fails
    pub fn is_reachable(&self) -> bool {
        match self.version() {
            Ok(_) => true,
            Err(e) => {
                log::debug!("AnkiConnect not reachable: {}", e);
                false
            }
        }
    }

    /// All deck names, sorted
    pub fn deck_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .invoke::<Option<Vec<String>>>("deckNames", json!({}))?
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    /// Create a deck; no-op if it already exists. Returns the deck id.
    pub fn create_deck(&self, deck: &str) -> Result<i64> {
        self.invoke("createDeck", json!({ "deck": deck }))
    }

    pub fn find_notes(&self, query: &str) -> Result<Vec<i64>> {
        self.invoke("findNotes", json!({ "query": query }))
    }

    pub fn notes_info(&self, note_ids: &[i64]) -> Result<Vec<NoteInfo>> {
        if note_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.invoke("notesInfo", json!({ "notes": note_ids }))
    }

    /// Field names of a note type, e.g. `["Front", "Back"]`
    pub fn model_field_names(&self, model: &str) -> Result<Vec<String>> {
        self.invoke("modelFieldNames", json!({ "modelName": model }))
    }

    /// Normalized fronts of every note in `deck`.
    pub fn existing_fronts(&self, deck: &str) -> Result<HashSet<String>> {
        let ids = self.find_notes(&format!("deck:\"{}\"", escape_query(deck)))?;
        let notes = self.notes_info(&ids)?;
        let names = [self.front_field.as_str(), "Front", "Question"];

        Ok(notes
            .iter()
            .filter_map(|note| note.field_value(&names))
            .map(normalize_front)
            .filter(|f| !f.is_empty())
            .collect())
    }

    /// Whether `deck` already holds a note with this front text.
    pub fn is_duplicate(&self, deck: &str, front: &str) -> Result<bool> {
        let query = duplicate_query(deck, &self.front_field, front);
        Ok(!self.find_notes(&query)?.is_empty())
    }

    /// Store-side shape of a card
    pub fn note_record(&self, deck: &str, card: &Card) -> NoteRecord {
        let mut fields = BTreeMap::new();
        fields.insert(self.front_field.clone(), card.front().to_string());
        fields.insert(self.back_field.clone(), card.back().to_string());

        NoteRecord {
            deck_name: deck.to_string(),
            model_name: self.note_type.clone(),
            fields,
            tags: self.tags.clone(),
            options: NoteOptions::default(),
        }
    }

    /// Submit cards in one batch. Returns one outcome per card, in order.
    pub fn add_notes(&self, deck: &str, cards: &[Card]) -> Result<Vec<AddOutcome>> {
        if cards.is_empty() {
            return Ok(Vec::new());
        }
        let notes: Vec<NoteRecord> = cards.iter().map(|c| self.note_record(deck, c)).collect();
        log::info!("Adding {} notes to deck '{}'", notes.len(), deck);

        let response = self.call(&self.client, "addNotes", json!({ "notes": notes }))?;
        add_outcomes(&response, cards.len())
    }

    /// Trigger AnkiWeb sync
    pub fn sync(&self) -> Result<()> {
        log::info!("Starting AnkiWeb sync");
        let response = self.call(&self.sync_client, "sync", json!({}))?;
        match error_message(&response.error) {
            Some(message) => Err(StoreError::Api(format!("sync failed: {}", message))),
            None => Ok(()),
        }
    }
}

fn error_message(error: &Value) -> Option<String> {
    match error {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Per-note outcomes from an `addNotes` envelope.
///
/// A result list maps ids to `Added` and nulls to `Rejected`. Newer AnkiConnect
/// versions instead return a null result with a list of error strings.
fn add_outcomes(response: &AnkiResponse, expected: usize) -> Result<Vec<AddOutcome>> {
    if let Value::Array(ids) = &response.result {
        return Ok((0..expected)
            .map(|i| match ids.get(i).and_then(Value::as_i64) {
                Some(id) => AddOutcome::Added(Some(id)),
                None => AddOutcome::Rejected("rejected by Anki (duplicate or invalid)".to_string()),
            })
            .collect());
    }

    match &response.error {
        Value::Array(errors) if errors.len() == expected => Ok(errors
            .iter()
            .map(|e| match e {
                Value::Null => AddOutcome::Added(None),
                Value::String(s) => AddOutcome::Rejected(s.clone()),
                other => AddOutcome::Rejected(other.to_string()),
            })
            .collect()),
        Value::Array(errors) => {
            // Only failures were listed; which notes they belong to is unknown
            let rejected = errors.iter().filter(|e| !e.is_null()).count().min(expected);
            log::warn!("AnkiConnect rejected {} of {} notes", rejected, expected);
            let mut outcomes: Vec<AddOutcome> = errors
                .iter()
                .filter(|e| !e.is_null())
                .take(rejected)
                .map(|e| AddOutcome::Rejected(e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string())))
                .collect();
            outcomes.resize(expected, AddOutcome::Added(None));
            Ok(outcomes)
        }
        error => match error_message(error) {
            Some(message) => Err(StoreError::Api(message)),
            None => Err(StoreError::InvalidResponse("addNotes returned no result".to_string())),
        },
    }
}

/// Escape Anki search metacharacters.
pub fn escape_query(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '*' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `deck:"<deck>" "<Field>:<front>"`
pub fn duplicate_query(deck: &str, front_field: &str, front: &str) -> String {
    format!(
        "deck:\"{}\" \"{}:{}\"",
        escape_query(deck),
        escape_query(front_field),
        escape_query(front)
    )
}
