//! AnkiConnect wire types

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request envelope: `{action, version, params}`
#[derive(Debug, Serialize)]
pub struct AnkiRequest<'a> {
    pub action: &'a str,
    pub version: u32,
    pub params: Value,
}

/// Response envelope: `{result, error}`
#[derive(Debug, Deserialize)]
pub struct AnkiResponse {
    #[serde(default)]
    pub result: Value,
    /// Usually a string; `addNotes` may report a per-note list
    #[serde(default)]
    pub error: Value,
}

/// Duplicate handling for `addNotes`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
    pub duplicate_scope: String,
}

impl Default for NoteOptions {
    fn default() -> Self {
        Self {
            allow_duplicate: false,
            duplicate_scope: "deck".to_string(),
        }
    }
}

/// A note as submitted to `addNotes`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub deck_name: String,
    pub model_name: String,
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub options: NoteOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteField {
    pub value: String,
    #[serde(default)]
    pub order: u32,
}

/// A stored note as returned by `notesInfo`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    pub note_id: i64,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fields: HashMap<String, NoteField>,
}

impl NoteInfo {
    /// Value of the first field present among `names`
    pub fn field_value(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.fields.get(*name))
            .map(|f| f.value.as_str())
    }
}

/// Outcome of one note in an `addNotes` batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stored; the id is unknown when AnkiConnect only reported errors
    Added(Option<i64>),
    Rejected(String),
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }
}
