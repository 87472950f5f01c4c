//! Flashcard store: the AnkiConnect HTTP API
//!
//! Every call is one `POST` of an `{action, version, params}` envelope to the
//! add-on's endpoint.

pub mod client;
pub mod errors;
pub mod models;

pub use client::{duplicate_query, escape_query, AnkiConnectClient};
pub use errors::{Result, StoreError};
pub use models::{AddOutcome, NoteInfo, NoteRecord};
