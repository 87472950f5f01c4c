//! Data models for generated flashcards

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A flashcard with question (front) and answer (back).
///
/// Both sides are non-empty after trimming; `Card::new` is the only way to
/// build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    front: String,
    back: String,
}

impl Card {
    /// Build a card, returning `None` when either side is blank.
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Option<Self> {
        let front = front.into().trim().to_string();
        let back = back.into().trim().to_string();
        if front.is_empty() || back.is_empty() {
            return None;
        }
        Some(Self { front, back })
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    /// Front text in the form used for duplicate comparison
    pub fn normalized_front(&self) -> String {
        normalize_front(&self.front)
    }
}

/// Normalize front text for duplicate comparison: lowercase, single spaces, trimmed.
pub fn normalize_front(front: &str) -> String {
    front
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Card style requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStyle {
    /// Plain front and back
    #[default]
    Basic,
    /// Question with a plain-language and a technical explanation
    Eli5,
    /// Question about a short code snippet, with an explanation
    Code,
}

impl CardStyle {
    pub const ALL: [CardStyle; 3] = [CardStyle::Basic, CardStyle::Eli5, CardStyle::Code];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Eli5 => "ELI5 / Technical",
            Self::Code => "Code snippet",
        }
    }

    /// The next style in cycling order (for UI toggles)
    pub fn next(&self) -> Self {
        match self {
            Self::Basic => Self::Eli5,
            Self::Eli5 => Self::Code,
            Self::Code => Self::Basic,
        }
    }
}

impl fmt::Display for CardStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Eli5 => "eli5",
            Self::Code => "code",
        };
        f.write_str(name)
    }
}

impl FromStr for CardStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "eli5" | "eli5_technical" => Ok(Self::Eli5),
            "code" => Ok(Self::Code),
            other => Err(format!("Unknown card style '{}' (expected basic, eli5 or code)", other)),
        }
    }
}

/// A generated card annotated for review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewCard {
    pub card: Card,
    pub is_duplicate: bool,
}

impl PreviewCard {
    pub fn new_count(cards: &[PreviewCard]) -> usize {
        cards.iter().filter(|c| !c.is_duplicate).count()
    }
}

/// Result of submitting a batch of cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReport {
    /// Notes the store accepted
    pub added: usize,
    /// Cards found to be duplicates or rejected by the store
    pub skipped: usize,
}

impl SubmitReport {
    pub fn total(&self) -> usize {
        self.added + self.skipped
    }
}
