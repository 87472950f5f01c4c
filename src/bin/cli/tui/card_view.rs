use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::app_state::TuiState;

pub fn draw(f: &mut Frame, area: Rect, state: &TuiState) {
    let selected = state
        .preview
        .as_ref()
        .and_then(|p| p.cards.get(state.card_selected));

    let title = match selected {
        Some(item) if item.is_duplicate => " Card (already in deck) ".to_string(),
        Some(_) => format!(" Card {} of {} ", state.card_selected + 1, state.card_count()),
        None => " Card ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    if selected.is_none() {
        let help_text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Pick a source tab (Tab), type a topic or URL, then press Enter.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "  Generated cards show up here for review before anything is added.",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(help_text).block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let text: Vec<Line> = state
        .detail_lines()
        .into_iter()
        .skip(state.detail_scroll)
        .map(|line| {
            if line == "Front:" || line == "Back:" {
                Line::from(Span::styled(line, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
            } else if line.starts_with("      ") {
                // Code block
                Line::from(Span::styled(line, Style::default().fg(Color::Green)))
            } else {
                Line::from(line)
            }
        })
        .collect();

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);
}
