use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::app_state::{Mode, TuiState};

pub fn draw(f: &mut Frame, area: Rect, state: &TuiState) {
    if let Some(task) = state.pending_task {
        let busy = Paragraph::new(format!(" {}", task.busy_message()))
            .style(Style::default().bg(Color::Yellow).fg(Color::Black));
        f.render_widget(busy, area);
        return;
    }

    // Show flash message if present
    if let Some(ref msg) = state.flash_message {
        let flash = Paragraph::new(format!(" {}", msg))
            .style(Style::default().bg(Color::Green).fg(Color::Black));
        f.render_widget(flash, area);
        return;
    }

    match state.mode {
        Mode::ConfirmAdd => {
            let text = format!(
                " Add {} card(s) to '{}'? Duplicates are skipped. y: confirm  any other key: cancel",
                state.card_count(),
                state.deck
            );
            let prompt = Paragraph::new(text)
                .style(Style::default().bg(Color::Blue).fg(Color::White));
            f.render_widget(prompt, area);
        }
        Mode::NewDeck => {
            let text = format!(" New deck: {}\u{2588}", state.input_text);
            let prompt = Paragraph::new(text)
                .style(Style::default().bg(Color::Blue).fg(Color::White));
            f.render_widget(prompt, area);
        }
        _ => {
            let hints = match state.mode {
                Mode::Input => {
                    " Type a topic or URL  Enter: generate  Tab: source  F2: deck  F3: style  Esc: cards "
                }
                Mode::Browse => {
                    " j/k: cards  J/K: scroll  a: add  d: deck  t: style  s: sync  r: retry Anki  i: edit  q: quit "
                }
                Mode::DeckPicker => " j/k: select  Enter: choose  Esc: cancel ",
                _ => unreachable!(),
            };

            let status = Paragraph::new(hints)
                .style(Style::default().bg(Color::DarkGray).fg(Color::White));
            f.render_widget(status, area);
        }
    }
}
