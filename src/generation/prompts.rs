//! Prompt and response-schema construction per card style.

use serde_json::{json, Value};

use crate::cards::CardStyle;
use crate::sources::{SourceDocument, SourceKind};
use crate::text::strip_tags;

/// Existing questions listed in the prompt at most
pub const MAX_AVOID_FRONTS: usize = 50;

/// JSON keys the model is asked to produce, leading key first
pub fn style_keys(style: CardStyle) -> &'static [&'static str] {
    match style {
        CardStyle::Basic => &["front", "back"],
        CardStyle::Eli5 => &["question", "eli5", "technical"],
        CardStyle::Code => &["question", "code", "answer"],
    }
}

pub fn system_prompt(style: CardStyle) -> &'static str {
    match style {
        CardStyle::Basic => {
            "You generate flashcard content. For each card output:
- front: one short question or prompt
- back: a concise, accurate answer (1-3 sentences)

Be concise. Output exactly one JSON array of objects with keys: front, back.
Use double quotes for all JSON keys and string values. No markdown, no text before or after the array."
        }
        CardStyle::Eli5 => {
            "You generate flashcard content. For each card output:
- question: one short question or prompt
- eli5: a 2-3 sentence explanation in plain language (ELI5 style)
- technical: a 2-4 sentence precise technical explanation

Be concise. Output exactly one JSON array of objects with keys: question, eli5, technical.
Use double quotes for all JSON keys and string values. No markdown, no text before or after the array."
        }
        CardStyle::Code => {
            "You generate flashcard content about code. For each card output:
- question: one short question (e.g. \"What does this code do?\" or \"What is the output?\")
- code: a short code snippet (few lines) that the question refers to
- answer: a clear explanation of what the code does and why (2-4 sentences)

Be concise. Output exactly one JSON array of objects with keys: question, code, answer.
Use double quotes for all JSON keys and string values. Escape any quotes inside strings. No markdown, no text before or after the array."
        }
    }
}

/// JSON schema passed as Ollama's `format` to constrain the output
pub fn response_schema(style: CardStyle) -> Value {
    let keys = style_keys(style);
    let properties: serde_json::Map<String, Value> = keys
        .iter()
        .map(|k| (k.to_string(), json!({ "type": "string" })))
        .collect();

    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": properties,
            "required": keys,
            "additionalProperties": false,
        }
    })
}

/// Build the user message for one generation request.
pub fn user_prompt(
    document: &SourceDocument,
    count: usize,
    style: CardStyle,
    existing_fronts: &[String],
) -> String {
    let keys = style_keys(style).join(", ");

    let mut prompt = match document.kind {
        SourceKind::Topic => format!("Generate exactly {} flashcards about: {}", count, document.body),
        SourceKind::Transcript | SourceKind::Article => {
            let label = if document.kind == SourceKind::Transcript {
                "transcript"
            } else {
                "article"
            };
            format!(
                "From the following {label}, generate exactly {count} flashcards. \
                 Base each card on concrete facts or ideas from the {label}. \
                 For each card output: {keys} (same JSON format as before).\n\n\
                 Title: {title}\n\n\
                 {heading}:\n\n{body}",
                label = label,
                count = count,
                keys = keys,
                title = document.title,
                heading = capitalize(label),
                body = document.body,
            )
        }
    };

    let avoid: Vec<String> = existing_fronts
        .iter()
        .map(|f| strip_tags(f))
        .filter(|f| !f.is_empty())
        .take(MAX_AVOID_FRONTS)
        .collect();

    if !avoid.is_empty() {
        prompt.push_str("\n\nThe deck already contains these questions. Do not repeat them or ask the same thing in other words:\n");
        for front in &avoid {
            prompt.push_str("- ");
            prompt.push_str(front);
            prompt.push('\n');
        }
    }

    prompt
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
