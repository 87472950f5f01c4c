use antor_lib::sources::normalize_topic;
use antor_lib::{CardStyle, Preview, SourceRequest};

use crate::app::App;
use crate::render::terminal as renderer;

/// Label of the deck picker entry that asks for a new name
pub const NEW_DECK_ENTRY: &str = "New deck\u{2026}";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Typing into the active source tab
    Input,
    /// Moving through generated cards
    Browse,
    DeckPicker,
    NewDeck,
    /// Waiting for `y` after `a`
    ConfirmAdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTab {
    Topic,
    YouTube,
    Article,
}

impl SourceTab {
    pub const ALL: [SourceTab; 3] = [SourceTab::Topic, SourceTab::YouTube, SourceTab::Article];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Topic => "Topic",
            Self::YouTube => "YouTube",
            Self::Article => "Article",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Topic => "e.g. photosynthesis",
            Self::YouTube => "https://www.youtube.com/watch?v=...",
            Self::Article => "https://...",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn request(&self, input: &str) -> SourceRequest {
        let input = input.to_string();
        match self {
            Self::Topic => SourceRequest::Topic(input),
            Self::YouTube => SourceRequest::Transcript(input),
            Self::Article => SourceRequest::Article(input),
        }
    }
}

/// Blocking work queued by a key press, run after the next draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    Generate,
    Add,
    Sync,
    Refresh,
}

impl Task {
    pub fn busy_message(&self) -> &'static str {
        match self {
            Self::Generate => "Generating cards (this can take a while)...",
            Self::Add => "Adding cards to Anki...",
            Self::Sync => "Syncing with AnkiWeb...",
            Self::Refresh => "Checking Anki...",
        }
    }
}

pub struct TuiState {
    pub app: App,
    pub mode: Mode,

    // Source input, one buffer per tab
    pub tab: SourceTab,
    pub inputs: [String; 3],

    pub style: CardStyle,
    pub deck: String,
    pub decks: Vec<String>,
    pub deck_selected: usize,
    pub store_online: bool,

    // Card review
    pub preview: Option<Preview>,
    pub card_selected: usize,
    pub detail_scroll: usize,

    pub pending_task: Option<Task>,

    // New deck name entry
    pub input_text: String,
    pub flash_message: Option<String>,

    pub quit: bool,
}

impl TuiState {
    pub fn new(app: App) -> Self {
        let style = app.config.card_style;
        let deck = app.config.deck_name.clone();
        let mut state = Self {
            app,
            mode: Mode::Input,
            tab: SourceTab::Topic,
            inputs: Default::default(),
            style,
            deck,
            decks: Vec::new(),
            deck_selected: 0,
            store_online: false,
            preview: None,
            card_selected: 0,
            detail_scroll: 0,
            pending_task: None,
            input_text: String::new(),
            flash_message: None,
            quit: false,
        };
        state.refresh_store();
        state
    }

    pub fn input(&self) -> &str {
        &self.inputs[self.tab.index()]
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.inputs[self.tab.index()]
    }

    /// Re-check Anki and reload its decks
    pub fn refresh_store(&mut self) {
        self.store_online = self.app.store().is_reachable();
        let mut decks = if self.store_online {
            self.app.pipeline.deck_choices(&self.deck)
        } else {
            vec![self.deck.clone()]
        };
        if !decks.contains(&self.deck) {
            decks.insert(0, self.deck.clone());
        }
        self.decks = decks;
    }

    /// Decks followed by the new-deck entry
    pub fn deck_entries(&self) -> Vec<String> {
        deck_entries(&self.decks)
    }

    pub fn open_deck_picker(&mut self) {
        self.deck_selected = self.decks.iter().position(|d| *d == self.deck).unwrap_or(0);
        self.mode = Mode::DeckPicker;
    }

    pub fn choose_selected_deck(&mut self) {
        let entries = self.deck_entries();
        match entries.get(self.deck_selected) {
            Some(entry) if entry == NEW_DECK_ENTRY => {
                self.input_text.clear();
                self.mode = Mode::NewDeck;
            }
            Some(entry) => {
                self.set_deck(entry.clone());
                self.mode = self.review_mode();
            }
            None => self.mode = self.review_mode(),
        }
    }

    pub fn create_deck_from_input(&mut self) {
        let name = normalize_topic(&self.input_text);
        self.input_text.clear();
        if name.is_empty() {
            self.mode = Mode::DeckPicker;
            return;
        }
        if !self.decks.contains(&name) {
            self.decks.push(name.clone());
        }
        self.flash_message = Some(format!("Deck '{}' will be created on the next add", name));
        self.set_deck(name);
        self.mode = self.review_mode();
    }

    fn set_deck(&mut self, deck: String) {
        if deck != self.deck {
            self.deck = deck;
            // Duplicate markers were computed against the old deck
            if let Some(preview) = self.preview.as_mut() {
                for item in &mut preview.cards {
                    item.is_duplicate = false;
                }
            }
        }
    }

    /// Mode to return to after a popup closes
    fn review_mode(&self) -> Mode {
        if self.has_cards() {
            Mode::Browse
        } else {
            Mode::Input
        }
    }

    pub fn toggle_style(&mut self) {
        self.style = self.style.next();
        self.flash_message = Some(format!("Style: {} (applies to the next generate)", self.style.label()));
    }

    pub fn has_cards(&self) -> bool {
        self.preview.as_ref().is_some_and(|p| !p.cards.is_empty())
    }

    pub fn card_count(&self) -> usize {
        self.preview.as_ref().map_or(0, |p| p.cards.len())
    }

    /// Detail pane lines for the selected card
    pub fn detail_lines(&self) -> Vec<String> {
        self.preview
            .as_ref()
            .and_then(|p| p.cards.get(self.card_selected))
            .map(|item| renderer::card_lines(&item.card))
            .unwrap_or_default()
    }

    pub fn card_move_down(&mut self) {
        if self.card_selected + 1 < self.card_count() {
            self.card_selected += 1;
            self.detail_scroll = 0;
        }
    }

    pub fn card_move_up(&mut self) {
        if self.card_selected > 0 {
            self.card_selected -= 1;
            self.detail_scroll = 0;
        }
    }

    pub fn detail_scroll_down(&mut self, amount: usize) {
        let max = self.detail_lines().len().saturating_sub(1);
        self.detail_scroll = self.detail_scroll.saturating_add(amount).min(max);
    }

    pub fn detail_scroll_up(&mut self, amount: usize) {
        self.detail_scroll = self.detail_scroll.saturating_sub(amount);
    }

    pub fn request_add(&mut self) {
        if !self.has_cards() {
            self.flash_message = Some("Nothing to add yet. Generate some cards first.".to_string());
        } else if !self.store_online {
            self.flash_message = Some("Anki is not reachable. Press r to retry.".to_string());
        } else {
            self.mode = Mode::ConfirmAdd;
        }
    }

    pub fn run_task(&mut self, task: Task) {
        match task {
            Task::Generate => self.generate(),
            Task::Add => self.add_cards(),
            Task::Sync => self.sync(),
            Task::Refresh => {
                self.refresh_store();
                self.flash_message = Some(if self.store_online {
                    format!("Anki is reachable ({} decks)", self.decks.len())
                } else {
                    "Anki is still not reachable".to_string()
                });
            }
        }
    }

    fn generate(&mut self) {
        let request = self.tab.request(self.input());
        self.store_online = self.app.store().is_reachable();
        let mark_in = self.store_online.then_some(self.deck.as_str());

        match self.app.pipeline.prepare(&request, self.style, mark_in) {
            Ok(preview) => {
                let message = if preview.cards.is_empty() {
                    "No cards were generated".to_string()
                } else {
                    format!(
                        "{} cards ready ({} already in '{}'). Press a to add.",
                        preview.cards.len(),
                        preview.duplicate_count(),
                        self.deck
                    )
                };
                self.preview = Some(preview);
                self.card_selected = 0;
                self.detail_scroll = 0;
                self.mode = self.review_mode();
                self.flash_message = Some(message);
            }
            Err(e) => {
                log::warn!("Generation failed: {}", e);
                self.flash_message = Some(e.to_string());
            }
        }
    }

    fn add_cards(&mut self) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        let cards = preview.all_cards();
        match self.app.pipeline.submit(&self.deck, &cards) {
            Ok(report) => {
                // Everything in the list is now in the deck
                for item in &mut preview.cards {
                    item.is_duplicate = true;
                }
                if !self.decks.contains(&self.deck) {
                    self.decks.push(self.deck.clone());
                }
                self.flash_message = Some(renderer::render_report(&report, &self.deck, false));
            }
            Err(e) => {
                if e.is_store_unavailable() {
                    self.store_online = false;
                }
                self.flash_message = Some(e.to_string());
            }
        }
    }

    fn sync(&mut self) {
        self.flash_message = Some(if self.app.pipeline.sync() {
            "Synced with AnkiWeb".to_string()
        } else {
            "Sync failed (is AnkiWeb sync set up in Anki?)".to_string()
        });
    }
}

fn deck_entries(decks: &[String]) -> Vec<String> {
    let mut entries = decks.to_vec();
    entries.push(NEW_DECK_ENTRY.to_string());
    entries
}
