use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::app_state::{Mode, SourceTab, TuiState};

pub fn draw(f: &mut Frame, area: Rect, state: &TuiState) {
    let is_active = state.mode == Mode::Input;

    let block = Block::default()
        .title(" Source ")
        .borders(Borders::ALL)
        .border_style(if is_active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        });

    let mut tabs = Vec::new();
    for tab in SourceTab::ALL {
        let style = if tab == state.tab {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        tabs.push(Span::styled(format!(" {} ", tab.title()), style));
        tabs.push(Span::raw(" "));
    }

    let input_line = if state.input().is_empty() && !is_active {
        Line::from(Span::styled(
            format!("> {}", state.tab.placeholder()),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(format!("> {}", state.input()))
    };

    let settings = Line::from(vec![
        Span::styled("Deck: ", Style::default().fg(Color::DarkGray)),
        Span::styled(state.deck.clone(), Style::default().fg(Color::Yellow)),
        Span::styled("   Style: ", Style::default().fg(Color::DarkGray)),
        Span::styled(state.style.label(), Style::default().fg(Color::Magenta)),
        Span::styled("   Model: ", Style::default().fg(Color::DarkGray)),
        Span::raw(state.app.ollama().model().to_string()),
    ]);

    let paragraph = Paragraph::new(vec![Line::from(tabs), input_line, settings]).block(block);
    f.render_widget(paragraph, area);

    if is_active {
        // Inside the border, after "> "
        let cursor_x = area.x + 3 + state.input().chars().count() as u16;
        let cursor_y = area.y + 2;
        f.set_cursor_position(Position::new(cursor_x.min(area.right().saturating_sub(2)), cursor_y));
    }
}
