//! Card generation with a local Ollama model
//!
//! This module provides:
//! - Prompts and JSON schemas for each card style
//! - The chat client for `POST /api/chat`
//! - A parser tolerant of the formatting noise local models produce

pub mod client;
pub mod errors;
pub mod parser;
pub mod prompts;

pub use client::{GenerationRequest, OllamaClient};
pub use errors::{GenerationError, Result};
pub use parser::parse_cards;
