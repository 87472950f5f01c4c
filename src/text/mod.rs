//! Text helpers shared by the fetchers and the card parser.

pub mod html;
pub mod json;

pub use html::{collapse_whitespace, html_to_text, strip_tags};

/// Truncate to at most `max_chars` characters, appending `marker` when cut.
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], marker),
        None => text.to_string(),
    }
}

/// Shorten for single-line display, ending with `...` when cut.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    truncate_chars(text, max_chars, "...")
}
