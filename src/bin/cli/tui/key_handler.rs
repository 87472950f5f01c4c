use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use super::app_state::{Mode, Task, TuiState};

pub fn handle_key(state: &mut TuiState, key: KeyEvent) {
    // Clear flash message on any keypress
    state.flash_message = None;

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.quit = true;
        return;
    }

    match state.mode {
        Mode::Input => handle_input_key(state, key),
        Mode::Browse => handle_browse_key(state, key),
        Mode::DeckPicker => handle_picker_key(state, key),
        Mode::NewDeck => handle_new_deck_key(state, key),
        Mode::ConfirmAdd => handle_confirm_key(state, key),
    }
}

fn handle_input_key(state: &mut TuiState, key: KeyEvent) {
    // Letters are typed, so settings need keys that never are
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::F(2) => state.open_deck_picker(),
        KeyCode::Char('d') if ctrl => state.open_deck_picker(),
        KeyCode::F(3) => state.toggle_style(),
        KeyCode::Char('t') if ctrl => state.toggle_style(),
        KeyCode::Esc => state.mode = Mode::Browse,
        KeyCode::Enter => state.pending_task = Some(Task::Generate),
        KeyCode::Tab => state.tab = state.tab.next(),
        KeyCode::BackTab => state.tab = state.tab.prev(),
        KeyCode::Backspace => {
            state.input_mut().pop();
        }
        KeyCode::Char(c) if !ctrl => state.input_mut().push(c),
        _ => {}
    }
}

fn handle_browse_key(state: &mut TuiState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => state.quit = true,
        KeyCode::Char('j') | KeyCode::Down => state.card_move_down(),
        KeyCode::Char('k') | KeyCode::Up => state.card_move_up(),
        KeyCode::Char('J') | KeyCode::PageDown => state.detail_scroll_down(5),
        KeyCode::Char('K') | KeyCode::PageUp => state.detail_scroll_up(5),
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Esc => state.mode = Mode::Input,
        KeyCode::Tab => {
            state.tab = state.tab.next();
            state.mode = Mode::Input;
        }
        KeyCode::Char('g') | KeyCode::Enter => state.pending_task = Some(Task::Generate),
        KeyCode::Char('t') => state.toggle_style(),
        KeyCode::Char('d') => state.open_deck_picker(),
        KeyCode::Char('a') => state.request_add(),
        KeyCode::Char('s') => state.pending_task = Some(Task::Sync),
        KeyCode::Char('r') => state.pending_task = Some(Task::Refresh),
        _ => {}
    }
}

fn handle_picker_key(state: &mut TuiState, key: KeyEvent) {
    let count = state.deck_entries().len();
    match key.code {
        KeyCode::Esc => state.mode = Mode::Browse,
        KeyCode::Char('j') | KeyCode::Down => {
            if state.deck_selected + 1 < count {
                state.deck_selected += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.deck_selected = state.deck_selected.saturating_sub(1);
        }
        KeyCode::Enter => state.choose_selected_deck(),
        _ => {}
    }
}

fn handle_new_deck_key(state: &mut TuiState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            state.input_text.clear();
            state.mode = Mode::DeckPicker;
        }
        KeyCode::Enter => state.create_deck_from_input(),
        KeyCode::Backspace => {
            state.input_text.pop();
        }
        KeyCode::Char(c) => state.input_text.push(c),
        _ => {}
    }
}

fn handle_confirm_key(state: &mut TuiState, key: KeyEvent) {
    state.mode = Mode::Browse;
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => state.pending_task = Some(Task::Add),
        _ => state.flash_message = Some("Add cancelled".to_string()),
    }
}

pub fn handle_mouse(state: &mut TuiState, mouse: MouseEvent) {
    match (state.mode, mouse.kind) {
        (Mode::Browse, MouseEventKind::ScrollDown) => state.card_move_down(),
        (Mode::Browse, MouseEventKind::ScrollUp) => state.card_move_up(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use antor_lib::CardStyle;

    /// State backed by a config whose Anki endpoint refuses connections
    fn offline_state() -> TuiState {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "anki_url = \"http://127.0.0.1:9\"\ncard_style = \"basic\"\n").unwrap();
        TuiState::new(App::new(Some(path.as_path())).unwrap())
    }

    fn press(state: &mut TuiState, code: KeyCode) {
        handle_key(state, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(state: &mut TuiState, c: char) {
        handle_key(state, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_deck_and_style_reachable_before_first_generate() {
        let mut state = offline_state();
        assert_eq!(state.mode, Mode::Input);
        assert!(!state.has_cards());

        press(&mut state, KeyCode::Char('d'));
        press(&mut state, KeyCode::Char('t'));
        assert_eq!(state.input(), "dt");

        press(&mut state, KeyCode::F(3));
        assert_eq!(state.style, CardStyle::Eli5);
        ctrl(&mut state, 't');
        assert_eq!(state.style, CardStyle::Code);
        assert_eq!(state.input(), "dt");

        press(&mut state, KeyCode::F(2));
        assert_eq!(state.mode, Mode::DeckPicker);
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, Mode::Browse);
        assert!(!state.quit);
    }

    #[test]
    fn test_new_deck_from_picker_before_generate() {
        let mut state = offline_state();
        ctrl(&mut state, 'd');
        assert_eq!(state.mode, Mode::DeckPicker);

        // The new-deck entry sits after the known decks
        let last = state.deck_entries().len() - 1;
        for _ in 0..last {
            press(&mut state, KeyCode::Down);
        }
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.mode, Mode::NewDeck);

        for c in "  Cell\u{00a0}\u{00a0}Biology ".chars() {
            press(&mut state, KeyCode::Char(c));
        }
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.deck, "Cell Biology");
        assert_eq!(state.mode, Mode::Input);
        assert!(state.decks.contains(&"Cell Biology".to_string()));
    }

    #[test]
    fn test_esc_without_cards_browses_instead_of_quitting() {
        let mut state = offline_state();
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.mode, Mode::Browse);
        assert!(!state.quit);
        press(&mut state, KeyCode::Char('d'));
        assert_eq!(state.mode, Mode::DeckPicker);
    }
}
