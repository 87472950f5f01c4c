mod app_state;
mod card_list;
mod card_view;
mod deck_picker;
mod key_handler;
mod source_bar;
mod status_bar;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;

use crate::app::App;
use app_state::TuiState;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let app = App::new(config_path)?;
    let mut state = TuiState::new(app);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Event loop
    let result = run_loop(&mut terminal, &mut state);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, state: &mut TuiState) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, state))?;

        if state.quit {
            return Ok(());
        }

        // The busy message is on screen now; run the blocking call
        if let Some(task) = state.pending_task.take() {
            state.run_task(task);
            // Drop keys typed while blocked
            while event::poll(Duration::ZERO)? {
                event::read()?;
            }
            continue;
        }

        // Poll for events with timeout
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    key_handler::handle_key(state, key);
                }
                Event::Mouse(mouse) => {
                    key_handler::handle_mouse(state, mouse);
                }
                _ => {}
            }
        }
    }
}
