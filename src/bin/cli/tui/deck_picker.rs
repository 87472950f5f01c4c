use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

use super::app_state::{Mode, TuiState};

/// Deck selection popup, centered over `area`
pub fn draw(f: &mut Frame, area: Rect, state: &TuiState) {
    let entries = state.deck_entries();
    let height = (entries.len() as u16 + 2).min(area.height);
    let width = area.width.saturating_mul(3) / 5;

    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    // Clear the area behind the popup
    f.render_widget(Clear, popup);

    if state.mode == Mode::NewDeck {
        let block = Block::default()
            .title(" New deck name ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let input_area = Rect { height: 3.min(popup.height), ..popup };
        f.render_widget(Clear, input_area);
        f.render_widget(Paragraph::new(state.input_text.clone()).block(block), input_area);
        let cursor_x = input_area.x + 1 + state.input_text.chars().count() as u16;
        f.set_cursor_position(Position::new(cursor_x, input_area.y + 1));
        return;
    }

    let items: Vec<ListItem> = entries
        .iter()
        .map(|name| {
            let style = if *name == state.deck {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(name.clone()).style(style)
        })
        .collect();

    let block = Block::default()
        .title(" Deck ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(state.deck_selected));

    f.render_stateful_widget(list, popup, &mut list_state);
}
