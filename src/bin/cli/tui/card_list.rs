use antor_lib::text::strip_tags;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use super::app_state::{Mode, TuiState};

pub fn draw(f: &mut Frame, area: Rect, state: &TuiState) {
    let is_active = matches!(state.mode, Mode::Browse | Mode::ConfirmAdd);

    let title = match &state.preview {
        Some(preview) => format!(
            " Cards: {} new, {} duplicate ",
            preview.new_count(),
            preview.duplicate_count()
        ),
        None => " Cards ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if is_active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        });

    let items: Vec<ListItem> = state
        .preview
        .iter()
        .flat_map(|p| p.cards.iter())
        .enumerate()
        .map(|(i, item)| {
            let front = strip_tags(item.card.front());
            if item.is_duplicate {
                ListItem::new(format!("{:>2}. [dup] {}", i + 1, front))
                    .style(Style::default().fg(Color::DarkGray))
            } else {
                ListItem::new(format!("{:>2}. {}", i + 1, front))
                    .style(Style::default().fg(Color::White))
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(if is_active { Color::DarkGray } else { Color::Black })
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if state.has_cards() {
        list_state.select(Some(state.card_selected));
    }

    f.render_stateful_widget(list, area, &mut list_state);
}
