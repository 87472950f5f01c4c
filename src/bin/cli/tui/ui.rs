use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::app_state::{Mode, TuiState};
use super::{card_list, card_view, deck_picker, source_bar, status_bar};

pub fn draw(f: &mut Frame, state: &mut TuiState) {
    let size = f.area();
    let banner_height = if state.store_online { 0 } else { 1 };

    // Source bar, warning banner, cards, status bar
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(banner_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(size);

    let source_area = outer[0];
    let banner_area = outer[1];
    let main_area = outer[2];
    let status_area = outer[3];

    // Horizontal split: card list (40%) | card detail (60%)
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(60),
        ])
        .split(main_area);

    source_bar::draw(f, source_area, state);
    if !state.store_online {
        draw_banner(f, banner_area, state);
    }
    card_list::draw(f, panels[0], state);
    card_view::draw(f, panels[1], state);
    status_bar::draw(f, status_area, state);

    if matches!(state.mode, Mode::DeckPicker | Mode::NewDeck) {
        deck_picker::draw(f, main_area, state);
    }
}

fn draw_banner(f: &mut Frame, area: Rect, state: &TuiState) {
    let text = format!(
        " Anki is not reachable at {}. Cards can be previewed but not added (r: retry)",
        state.app.store().url()
    );
    let banner = Paragraph::new(text)
        .style(Style::default().bg(Color::Red).fg(Color::White).add_modifier(Modifier::BOLD));
    f.render_widget(banner, area);
}
