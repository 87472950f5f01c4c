use antor_lib::cards::{Card, PreviewCard, SubmitReport};
use antor_lib::text::{ellipsize, strip_tags};
use antor_lib::Preview;
use regex::Regex;

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Field text shown per preview line
const PREVIEW_FIELD_CHARS: usize = 120;

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Split an HTML card field at `<br>` runs and the ELI5/technical divider,
/// returning plain-text lines.
pub fn field_lines(html: &str) -> Vec<String> {
    let br_re = Regex::new(r"(?i)(?:<br\s*/?>\s*)+").unwrap();
    let pre_re = Regex::new(r"(?is)<pre>(.*?)</pre>").unwrap();

    let mut lines = Vec::new();
    for part in br_re.split(html) {
        if let Some(caps) = pre_re.captures(part) {
            // Keep code line breaks
            let code = antor_lib::text::html::decode_entities(&caps[1]);
            lines.extend(code.lines().map(|l| format!("    {}", l.trim_end())));
            continue;
        }
        let text = strip_tags(part);
        if !text.is_empty() && text != "——" {
            lines.push(text);
        }
    }
    lines
}

/// Plain lines for one card (used by the TUI detail pane)
pub fn card_lines(card: &Card) -> Vec<String> {
    let mut lines = vec!["Front:".to_string()];
    lines.extend(field_lines(card.front()).into_iter().map(|l| format!("  {}", l)));
    lines.push(String::new());
    lines.push("Back:".to_string());
    lines.extend(field_lines(card.back()).into_iter().map(|l| format!("  {}", l)));
    lines
}

/// Terminal preview of generated cards
pub fn render_preview(preview: &Preview, marked: bool, use_color: bool) -> String {
    let mut out = Vec::new();
    out.push(paint(
        &format!(
            "--- Preview: {} {} cards from {} '{}' ---",
            preview.cards.len(),
            preview.style,
            preview.document.kind,
            preview.document.title
        ),
        Color::BOLD,
        use_color,
    ));
    out.push(String::new());

    for (i, item) in preview.cards.iter().enumerate() {
        out.extend(render_card(i + 1, item, use_color));
        out.push(String::new());
    }

    if marked {
        out.push(format!(
            "--- {} new, {} duplicates ---",
            preview.new_count(),
            preview.duplicate_count()
        ));
    }
    out.join("\n")
}

fn render_card(number: usize, item: &PreviewCard, use_color: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let dup = if item.is_duplicate {
        format!(" {}", paint("(DUPLICATE)", Color::YELLOW, use_color))
    } else {
        String::new()
    };
    lines.push(format!("[{}]{}", number, dup));

    for (i, line) in field_lines(item.card.front()).iter().enumerate() {
        let label = if i == 0 { "Q: " } else { "   " };
        lines.push(format!("  {}{}", paint(label, Color::CYAN, use_color), ellipsize(line, PREVIEW_FIELD_CHARS)));
    }
    for (i, line) in field_lines(item.card.back()).iter().enumerate() {
        let label = if i == 0 { "A: " } else { "   " };
        lines.push(format!("  {}{}", paint(label, Color::GREEN, use_color), ellipsize(line, PREVIEW_FIELD_CHARS)));
    }
    lines
}

pub fn render_report(report: &SubmitReport, deck: &str, use_color: bool) -> String {
    let added = paint(&report.added.to_string(), Color::GREEN, use_color);
    let mut line = format!("Added {} note(s) to deck '{}'.", added, deck);
    if report.skipped > 0 {
        line.push_str(&format!(" Skipped {} (duplicate or rejected).", report.skipped));
    }
    line
}

pub fn render_error(message: &str, use_color: bool) -> String {
    paint(message, Color::RED, use_color)
}

pub fn render_status(name: &str, ok: bool, detail: &str, use_color: bool) -> String {
    // Pad before painting so escape codes don't count toward the width
    let mark = if ok {
        paint(&format!("{:<12}", "ok"), Color::GREEN, use_color)
    } else {
        paint(&format!("{:<12}", "unreachable"), Color::RED, use_color)
    };
    format!("{:<8} {} {}", name, mark, paint(detail, Color::GRAY, use_color))
}
