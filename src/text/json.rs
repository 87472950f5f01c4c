//! Locating JSON arrays embedded in free text (model output, inline page scripts).

/// Return the balanced `[...]` span that opens at byte offset `start`.
///
/// Brackets inside JSON string literals are ignored, including escaped quotes.
pub fn balanced_array_at(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Find the first balanced array in `text` that parses as JSON.
pub fn first_json_array(text: &str) -> Option<serde_json::Value> {
    text.match_indices('[').find_map(|(idx, _)| {
        let candidate = balanced_array_at(text, idx)?;
        serde_json::from_str::<serde_json::Value>(candidate)
            .ok()
            .filter(|v| v.is_array())
    })
}

/// The outermost `[` .. `]` span, balanced or not.
pub fn outer_bracket_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}
