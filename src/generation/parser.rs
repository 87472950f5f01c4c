//! Tolerant parsing of model output into cards.
//!
//! Local models do not always honour the requested format. The parser tries,
//! in order: the whole text as JSON, the first balanced array, the outermost
//! bracket span, an array of objects with the braces missing, flat key/value
//! arrays, and finally a scan for `"key": "value"` pairs.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use super::prompts::style_keys;
use crate::cards::{Card, CardStyle};
use crate::text::json::{first_json_array, outer_bracket_span};

/// One model record keyed by canonical field name
type Record = HashMap<&'static str, String>;

/// Parse raw model output into cards of `style`, dropping incomplete entries.
pub fn parse_cards(raw: &str, style: CardStyle) -> Vec<Card> {
    extract_records(raw, style)
        .iter()
        .filter_map(|record| compose_card(record, style))
        .collect()
}

fn extract_records(raw: &str, style: CardStyle) -> Vec<Record> {
    let text = strip_code_fence(raw.trim());

    if let Some(records) = parse_json_candidates(text).and_then(|v| object_records(&v, style)) {
        return records;
    }

    if let Some(records) = repair_missing_braces(text, style)
        .and_then(|s| serde_json::from_str::<Value>(&s).ok())
        .and_then(|v| object_records(&v, style))
    {
        log::debug!("Parsed model output after inserting missing braces");
        return records;
    }

    if let Some(records) = flat_key_value_records(text, style) {
        log::debug!("Parsed model output as flat key/value arrays");
        return records;
    }

    if let Some(records) = scan_key_value_pairs(text, style) {
        log::debug!("Parsed model output by scanning key/value pairs");
        return records;
    }

    Vec::new()
}

/// Inner text of a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let fence_re = Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)\s*```").unwrap();
    match fence_re.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text,
    }
}

fn parse_json_candidates(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .or_else(|| first_json_array(text))
        .or_else(|| outer_bracket_span(text).and_then(|s| serde_json::from_str(s).ok()))
}

/// Map a model key onto the style's canonical field, case-insensitively.
fn canonical_key(key: &str, style: CardStyle) -> Option<&'static str> {
    let key = key.trim().to_lowercase();
    if let Some(k) = style_keys(style).iter().copied().find(|k| *k == key) {
        return Some(k);
    }
    match (style, key.as_str()) {
        (CardStyle::Basic, "question") => Some("front"),
        (CardStyle::Basic, "answer") => Some("back"),
        _ => None,
    }
}

fn leading_key(style: CardStyle) -> &'static str {
    style_keys(style)[0]
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Records from an array of objects, a single object, or a `{"cards": [...]}` wrapper.
fn object_records(value: &Value, style: CardStyle) -> Option<Vec<Record>> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            let has_field = map.keys().any(|k| canonical_key(k, style).is_some());
            match map.values().find(|v| v.is_array()) {
                Some(inner) if !has_field => return object_records(inner, style),
                _ => vec![value],
            }
        }
        _ => return None,
    };

    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| item.as_object())
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| canonical_key(k, style).map(|key| (key, value_text(v))))
                .collect::<Record>()
        })
        .filter(|record| !record.is_empty())
        .collect();

    (!records.is_empty()).then_some(records)
}

/// Turn `[ "question": "..", "eli5": "..", "question": .. ]` into an array of objects.
fn repair_missing_braces(text: &str, style: CardStyle) -> Option<String> {
    let start = text.find('[')?;
    let mut span = text[start..].trim().to_string();
    if !span.ends_with(']') {
        span.push(']');
    }

    let lead = regex::escape(leading_key(style));
    let lead_re = Regex::new(&format!(r#"(?i)"{}"\s*:"#, lead)).unwrap();
    if !lead_re.is_match(&span) {
        return None;
    }

    let first_re = Regex::new(&format!(r#"(?i)^\[\s*"({})""#, lead)).unwrap();
    let repaired = first_re.replace(&span, r#"[ {"$1""#);

    let between_re = Regex::new(&format!(r#"(?i)(?:,\s*|[\r\n]+\s*)"({})"\s*:"#, lead)).unwrap();
    let repaired = between_re.replace_all(&repaired, r#"}, { "$1":"#);

    let close_re = Regex::new(r"\s*\]\s*$").unwrap();
    Some(close_re.replace(&repaired, " } ]").into_owned())
}

/// Regroup `["question","Q","eli5","E", ...]`, possibly split over several arrays.
fn flat_key_value_records(text: &str, style: CardStyle) -> Option<Vec<Record>> {
    let join_re = Regex::new(r"\]\s*,?\s*\[").unwrap();
    let merged = join_re.replace_all(text, ", ");
    let span = outer_bracket_span(&merged)?;
    let flat: Vec<Value> = serde_json::from_str(span).ok()?;

    let lead = leading_key(style);
    let mut records = Vec::new();
    let mut current = Record::new();
    let mut iter = flat.iter();

    while let Some(item) = iter.next() {
        let Some(key) = item.as_str().and_then(|s| canonical_key(s, style)) else {
            continue;
        };
        let Some(value) = iter.next() else {
            break;
        };
        if key == lead && !current.is_empty() {
            records.push(std::mem::take(&mut current));
        }
        if let Some(s) = value.as_str() {
            current.insert(key, s.trim().to_string());
        }
    }
    if !current.is_empty() {
        records.push(current);
    }

    (!records.is_empty()).then_some(records)
}

/// Last resort: find `"key": "value"` pairs in order; the leading key starts a record.
fn scan_key_value_pairs(text: &str, style: CardStyle) -> Option<Vec<Record>> {
    let mut names: Vec<&str> = style_keys(style).to_vec();
    if style == CardStyle::Basic {
        names.extend(["question", "answer"]);
    }
    let alternatives = names.iter().map(|n| regex::escape(n)).collect::<Vec<_>>().join("|");
    let pair_re = Regex::new(&format!(r#"(?i)"({})"\s*:\s*""#, alternatives)).unwrap();

    let lead = leading_key(style);
    let mut records: Vec<Record> = Vec::new();
    let mut pos = 0;

    while let Some(caps) = pair_re.captures_at(text, pos) {
        let whole = caps.get(0).map(|m| m.end()).unwrap_or(text.len());
        let Some(key) = canonical_key(&caps[1], style) else {
            pos = whole;
            continue;
        };
        // `whole` is one past the value's opening quote
        let Some((value, after)) = quoted_value(text, whole - 1) else {
            pos = whole;
            continue;
        };
        pos = after;

        if key == lead {
            let mut record = Record::new();
            record.insert(key, value);
            records.push(record);
        } else if let Some(record) = records.last_mut() {
            record.insert(key, value);
        }
    }

    (!records.is_empty()).then_some(records)
}

/// Read the JSON string literal whose opening quote is at `open`.
/// Returns the decoded value and the offset after the closing quote.
fn quoted_value(text: &str, open: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'"') {
        return None;
    }
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => {
                let literal = &text[open..=i];
                let value = serde_json::from_str::<String>(literal).unwrap_or_else(|_| {
                    literal[1..literal.len() - 1]
                        .replace("\\\"", "\"")
                        .replace("\\\\", "\\")
                });
                return Some((value.trim().to_string(), i + 1));
            }
            _ => i += 1,
        }
    }
    None
}

fn field<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).map(String::as_str).unwrap_or("")
}

/// Compose a record into front/back text for the style.
fn compose_card(record: &Record, style: CardStyle) -> Option<Card> {
    match style {
        CardStyle::Basic => Card::new(field(record, "front"), field(record, "back")),
        CardStyle::Eli5 => {
            let eli5 = field(record, "eli5");
            let technical = field(record, "technical");
            let back = match (eli5.is_empty(), technical.is_empty()) {
                (false, false) => format!("ELI5: {}<br><br>——<br><br>Technical: {}", eli5, technical),
                (false, true) => format!("ELI5: {}", eli5),
                (true, false) => format!("Technical: {}", technical),
                (true, true) => String::new(),
            };
            Card::new(field(record, "question"), back)
        }
        CardStyle::Code => {
            let question = field(record, "question");
            let code = field(record, "code");
            if question.is_empty() {
                return None;
            }
            let front = if code.is_empty() {
                question.to_string()
            } else {
                format!("{}<br><br><pre>{}</pre>", question, html_escape::encode_text(code))
            };
            Card::new(front, field(record, "answer"))
        }
    }
}
