//! HTML text extraction utilities for article pages and card fields.

use regex::Regex;

/// Extract readable plain text from an HTML document.
///
/// Strips `<script>`, `<style>`, `<nav>`, `<header>`, `<footer>`, `<aside>`,
/// all remaining tags, decodes HTML entities, and normalizes whitespace.
pub fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();

    // Remove non-content elements together with their bodies
    let chrome_re = Regex::new(
        r"(?is)<(script|style|noscript|nav|header|footer|aside|form|iframe)\b[^>]*>.*?</(script|style|noscript|nav|header|footer|aside|form|iframe)>",
    )
    .unwrap();
    text = chrome_re.replace_all(&text, "").to_string();

    let comment_re = Regex::new(r"(?s)<!--.*?-->").unwrap();
    text = comment_re.replace_all(&text, "").to_string();

    // Block elements become line breaks
    let block_re = Regex::new(r"(?i)</?(div|p|br|h[1-6]|li|tr|blockquote|section|article|main|figure|figcaption|details|summary|pre)[^>]*>").unwrap();
    text = block_re.replace_all(&text, "\n").to_string();

    let tag_re = Regex::new(r"<[^>]+>").unwrap();
    text = tag_re.replace_all(&text, "").to_string();

    text = decode_entities(&text);

    let space_re = Regex::new(r"[ \t\u{a0}]+").unwrap();
    text = space_re.replace_all(&text, " ").to_string();

    let newline_re = Regex::new(r"\n\s*\n+").unwrap();
    text = newline_re.replace_all(&text, "\n\n").to_string();

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Strip tags from a short HTML fragment (a card field) and collapse it to one line.
pub fn strip_tags(fragment: &str) -> String {
    let br_re = Regex::new(r"(?i)<br\s*/?>").unwrap();
    let text = br_re.replace_all(fragment, " ");
    let tag_re = Regex::new(r"<[^>]+>").unwrap();
    let text = tag_re.replace_all(&text, "");
    collapse_whitespace(&decode_entities(&text))
}

/// Decode named and numeric HTML entities.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the `<title>` content from an HTML document.
pub fn extract_html_title(html: &str) -> Option<String> {
    let title_re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?;
    title_re
        .captures(html)
        .map(|caps| strip_tags(&caps[1]))
        .filter(|t| !t.is_empty())
}

/// Extract the `content` of a `<meta property|name="...">` tag.
pub fn extract_meta_content(html: &str, property: &str) -> Option<String> {
    let pattern = format!(
        r#"(?is)<meta[^>]+(?:property|name)\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(property)
    );
    let meta_re = Regex::new(&pattern).ok()?;
    let tag = meta_re.find(html)?.as_str();

    let content_re = Regex::new(r#"(?is)content\s*=\s*["']([^"']*)["']"#).ok()?;
    content_re
        .captures(tag)
        .map(|caps| collapse_whitespace(&decode_entities(&caps[1])))
        .filter(|c| !c.is_empty())
}
