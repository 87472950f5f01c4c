//! Flashcards produced by generation and consumed by the store client
//!
//! This module provides:
//! - The validated `Card` type and its duplicate-comparison form
//! - Card styles the model can be asked for
//! - Preview and submission report types shared by both front ends

pub mod models;

pub use models::*;
