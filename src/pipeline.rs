//! Orchestration: fetch a source, generate cards, mark duplicates, submit.
//!
//! The pipeline holds no state between runs. Its collaborators sit behind
//! small traits so runs can be exercised without live services.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::cards::{Card, CardStyle, PreviewCard, SubmitReport};
use crate::config::AppConfig;
use crate::generation::{GenerationError, GenerationRequest, OllamaClient};
use crate::sources::{SourceDocument, SourceError, SourceFetcher, SourceRequest};
use crate::store::{AddOutcome, AnkiConnectClient, StoreError};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::Store(StoreError::Unavailable { .. }))
    }
}

/// Supplies source documents
pub trait DocumentFetcher {
    fn fetch(&self, request: &SourceRequest) -> std::result::Result<SourceDocument, SourceError>;
}

/// Turns a document into cards
pub trait CardGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> std::result::Result<Vec<Card>, GenerationError>;
}

/// The flashcard store operations a run needs
pub trait NoteStore {
    fn is_reachable(&self) -> bool;
    fn deck_names(&self) -> std::result::Result<Vec<String>, StoreError>;
    fn create_deck(&self, deck: &str) -> std::result::Result<(), StoreError>;
    fn existing_fronts(&self, deck: &str) -> std::result::Result<HashSet<String>, StoreError>;
    fn is_duplicate(&self, deck: &str, front: &str) -> std::result::Result<bool, StoreError>;
    fn add_notes(&self, deck: &str, cards: &[Card]) -> std::result::Result<Vec<AddOutcome>, StoreError>;
    fn sync(&self) -> std::result::Result<(), StoreError>;
}

impl DocumentFetcher for SourceFetcher {
    fn fetch(&self, request: &SourceRequest) -> std::result::Result<SourceDocument, SourceError> {
        SourceFetcher::fetch(self, request)
    }
}

impl CardGenerator for OllamaClient {
    fn generate(&self, request: &GenerationRequest<'_>) -> std::result::Result<Vec<Card>, GenerationError> {
        OllamaClient::generate(self, request)
    }
}

impl NoteStore for AnkiConnectClient {
    fn is_reachable(&self) -> bool {
        AnkiConnectClient::is_reachable(self)
    }

    fn deck_names(&self) -> std::result::Result<Vec<String>, StoreError> {
        AnkiConnectClient::deck_names(self)
    }

    fn create_deck(&self, deck: &str) -> std::result::Result<(), StoreError> {
        AnkiConnectClient::create_deck(self, deck).map(|_| ())
    }

    fn existing_fronts(&self, deck: &str) -> std::result::Result<HashSet<String>, StoreError> {
        AnkiConnectClient::existing_fronts(self, deck)
    }

    fn is_duplicate(&self, deck: &str, front: &str) -> std::result::Result<bool, StoreError> {
        AnkiConnectClient::is_duplicate(self, deck, front)
    }

    fn add_notes(&self, deck: &str, cards: &[Card]) -> std::result::Result<Vec<AddOutcome>, StoreError> {
        AnkiConnectClient::add_notes(self, deck, cards)
    }

    fn sync(&self) -> std::result::Result<(), StoreError> {
        AnkiConnectClient::sync(self)
    }
}

/// Generated cards ready for review
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub document: SourceDocument,
    pub style: CardStyle,
    pub cards: Vec<PreviewCard>,
}

impl Preview {
    pub fn new_count(&self) -> usize {
        PreviewCard::new_count(&self.cards)
    }

    pub fn duplicate_count(&self) -> usize {
        self.cards.len() - self.new_count()
    }

    /// Cards not already in the deck
    pub fn new_cards(&self) -> Vec<Card> {
        self.cards
            .iter()
            .filter(|c| !c.is_duplicate)
            .map(|c| c.card.clone())
            .collect()
    }

    pub fn all_cards(&self) -> Vec<Card> {
        self.cards.iter().map(|c| c.card.clone()).collect()
    }
}

/// Fetch → generate → submit, over any set of collaborators
pub struct Pipeline<F, G, S> {
    fetcher: F,
    generator: G,
    store: S,
    cards_per_run: usize,
}

/// The pipeline wired to the real services
pub type ServicePipeline = Pipeline<SourceFetcher, OllamaClient, AnkiConnectClient>;

impl ServicePipeline {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Pipeline::new(
            SourceFetcher::new(config)?,
            OllamaClient::new(config)?,
            AnkiConnectClient::new(config)?,
            config.cards_per_run,
        ))
    }
}

impl<F, G, S> Pipeline<F, G, S>
where
    F: DocumentFetcher,
    G: CardGenerator,
    S: NoteStore,
{
    pub fn new(fetcher: F, generator: G, store: S, cards_per_run: usize) -> Self {
        Self {
            fetcher,
            generator,
            store,
            cards_per_run,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Fetch the source and generate cards.
    ///
    /// With `mark_duplicates_in = Some(deck)`, existing fronts of that deck are
    /// loaded (when the store is reachable) to steer the model and to flag
    /// duplicates. Without it the store is never contacted.
    pub fn prepare(
        &self,
        request: &SourceRequest,
        style: CardStyle,
        mark_duplicates_in: Option<&str>,
    ) -> Result<Preview> {
        let document = self.fetcher.fetch(request)?;
        log::info!("Fetched {} '{}' ({} chars)", document.kind, document.title, document.body.chars().count());

        let existing = match mark_duplicates_in {
            Some(deck) => self.load_existing_fronts(deck),
            None => HashSet::new(),
        };
        let mut existing_list: Vec<String> = existing.iter().cloned().collect();
        existing_list.sort();

        let cards = self.generator.generate(&GenerationRequest {
            document: &document,
            count: self.cards_per_run,
            style,
            existing_fronts: &existing_list,
        })?;

        let cards = cards
            .into_iter()
            .map(|card| {
                let is_duplicate = existing.contains(&card.normalized_front());
                PreviewCard { card, is_duplicate }
            })
            .collect();

        Ok(Preview {
            document,
            style,
            cards,
        })
    }

    fn load_existing_fronts(&self, deck: &str) -> HashSet<String> {
        if !self.store.is_reachable() {
            log::warn!("Anki is not reachable; duplicates will not be marked");
            return HashSet::new();
        }
        match self.store.existing_fronts(deck) {
            Ok(fronts) => fronts,
            Err(e) => {
                log::warn!("Could not load existing cards from '{}': {}", deck, e);
                HashSet::new()
            }
        }
    }

    /// Add the cards to `deck`, skipping duplicates.
    ///
    /// `added + skipped` always equals `cards.len()`.
    pub fn submit(&self, deck: &str, cards: &[Card]) -> Result<SubmitReport> {
        self.store.create_deck(deck)?;
        // Normalized comparison, matching the preview markers
        let existing = self.store.existing_fronts(deck)?;

        let mut seen = HashSet::new();
        let mut to_add = Vec::new();
        for card in cards {
            let normalized = card.normalized_front();
            if existing.contains(&normalized) {
                log::debug!("Skipping duplicate: {}", card.front());
                continue;
            }
            if !seen.insert(normalized) {
                log::debug!("Skipping repeated card in batch: {}", card.front());
                continue;
            }
            if self.store.is_duplicate(deck, card.front())? {
                log::debug!("Skipping duplicate: {}", card.front());
                continue;
            }
            to_add.push(card.clone());
        }

        let added = if to_add.is_empty() {
            0
        } else {
            let outcomes = self.store.add_notes(deck, &to_add)?;
            for outcome in &outcomes {
                if let AddOutcome::Rejected(reason) = outcome {
                    log::info!("Anki rejected a note: {}", reason);
                }
            }
            outcomes.iter().filter(|o| o.is_added()).count().min(to_add.len())
        };

        let report = SubmitReport {
            added,
            skipped: cards.len() - added,
        };
        log::info!("Added {} cards to '{}', skipped {}", report.added, deck, report.skipped);
        Ok(report)
    }

    /// Ask the store to sync. Failures are logged, never returned.
    pub fn sync(&self) -> bool {
        match self.store.sync() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Sync failed: {}", e);
                false
            }
        }
    }

    /// Deck choices for a selector: store decks plus the configured default
    pub fn deck_choices(&self, default_deck: &str) -> Vec<String> {
        let mut decks = self.store.deck_names().unwrap_or_else(|e| {
            log::warn!("Could not list decks: {}", e);
            Vec::new()
        });
        if !decks.iter().any(|d| d == default_deck) {
            decks.insert(0, default_deck.to_string());
        }
        decks
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::cards::normalize_front;
    use crate::sources::SourceKind;

    struct FakeFetcher {
        fail: bool,
    }

    impl DocumentFetcher for FakeFetcher {
        fn fetch(&self, request: &SourceRequest) -> std::result::Result<SourceDocument, SourceError> {
            if self.fail {
                return Err(SourceError::NoTranscript(
                    "This video has captions/transcript disabled.".to_string(),
                ));
            }
            let body = match request {
                SourceRequest::Topic(t) | SourceRequest::Transcript(t) | SourceRequest::Article(t) => t.clone(),
            };
            Ok(SourceDocument {
                title: body.clone(),
                body,
                kind: SourceKind::Topic,
            })
        }
    }

    /// Returns the given fronts, recording every call
    struct FakeGenerator {
        fronts: Vec<&'static str>,
        calls: Cell<usize>,
        seen_existing: RefCell<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(fronts: Vec<&'static str>) -> Self {
            Self {
                fronts,
                calls: Cell::new(0),
                seen_existing: RefCell::new(Vec::new()),
            }
        }
    }

    impl CardGenerator for FakeGenerator {
        fn generate(&self, request: &GenerationRequest<'_>) -> std::result::Result<Vec<Card>, GenerationError> {
            self.calls.set(self.calls.get() + 1);
            *self.seen_existing.borrow_mut() = request.existing_fronts.to_vec();
            Ok(self
                .fronts
                .iter()
                .take(request.count)
                .filter_map(|f| Card::new(*f, format!("answer to {}", f)))
                .collect())
        }
    }

    /// In-memory deck store with AnkiConnect's duplicate rejection
    #[derive(Default)]
    struct FakeStore {
        down: bool,
        notes: RefCell<Vec<(String, String)>>,
        decks: RefCell<Vec<String>>,
        /// Fronts another client adds between duplicate check and submit
        racing: RefCell<Vec<String>>,
    }

    impl FakeStore {
        fn check(&self) -> std::result::Result<(), StoreError> {
            if self.down {
                return Err(StoreError::Unavailable {
                    url: "http://127.0.0.1:8765".to_string(),
                    message: "connection refused".to_string(),
                });
            }
            Ok(())
        }

        fn contains(&self, deck: &str, front: &str) -> bool {
            let front = normalize_front(front);
            self.notes
                .borrow()
                .iter()
                .any(|(d, f)| d == deck && normalize_front(f) == front)
        }
    }

    impl NoteStore for FakeStore {
        fn is_reachable(&self) -> bool {
            !self.down
        }

        fn deck_names(&self) -> std::result::Result<Vec<String>, StoreError> {
            self.check()?;
            Ok(self.decks.borrow().clone())
        }

        fn create_deck(&self, deck: &str) -> std::result::Result<(), StoreError> {
            self.check()?;
            let mut decks = self.decks.borrow_mut();
            if !decks.iter().any(|d| d == deck) {
                decks.push(deck.to_string());
            }
            Ok(())
        }

        fn existing_fronts(&self, deck: &str) -> std::result::Result<HashSet<String>, StoreError> {
            self.check()?;
            Ok(self
                .notes
                .borrow()
                .iter()
                .filter(|(d, _)| d == deck)
                .map(|(_, f)| normalize_front(f))
                .collect())
        }

        // Exact field search, as AnkiConnect's findNotes does
        fn is_duplicate(&self, deck: &str, front: &str) -> std::result::Result<bool, StoreError> {
            self.check()?;
            Ok(self.notes.borrow().iter().any(|(d, f)| d == deck && f == front))
        }

        fn add_notes(&self, deck: &str, cards: &[Card]) -> std::result::Result<Vec<AddOutcome>, StoreError> {
            self.check()?;
            for front in self.racing.borrow_mut().drain(..) {
                self.notes.borrow_mut().push((deck.to_string(), front));
            }
            Ok(cards
                .iter()
                .map(|card| {
                    if self.contains(deck, card.front()) {
                        AddOutcome::Rejected("cannot create note because it is a duplicate".to_string())
                    } else {
                        self.notes
                            .borrow_mut()
                            .push((deck.to_string(), card.front().to_string()));
                        AddOutcome::Added(Some(self.notes.borrow().len() as i64))
                    }
                })
                .collect())
        }

        fn sync(&self) -> std::result::Result<(), StoreError> {
            self.check()
        }
    }

    fn topic(t: &str) -> SourceRequest {
        SourceRequest::Topic(t.to_string())
    }

    #[test]
    fn test_fetch_failure_skips_generation() {
        let pipeline = Pipeline::new(
            FakeFetcher { fail: true },
            FakeGenerator::new(vec!["Q"]),
            FakeStore::default(),
            5,
        );
        let err = pipeline
            .prepare(&SourceRequest::Transcript("abcdefghijk".to_string()), CardStyle::Basic, None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Source(SourceError::NoTranscript(_))));
        assert_eq!(pipeline.generator().calls.get(), 0);
    }

    #[test]
    fn test_preview_caps_count_and_works_without_store() {
        let store = FakeStore {
            down: true,
            ..FakeStore::default()
        };
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeGenerator::new(vec!["Q1", "Q2", "Q3", "Q4", "Q5", "Q6", "Q7"]),
            store,
            5,
        );

        let preview = pipeline.prepare(&topic("osmosis"), CardStyle::Basic, None).unwrap();
        assert_eq!(preview.cards.len(), 5);
        assert!(preview
            .cards
            .iter()
            .all(|c| !c.is_duplicate && !c.card.front().is_empty() && !c.card.back().is_empty()));

        // Marking degrades to no marks when the store is down
        let preview = pipeline.prepare(&topic("osmosis"), CardStyle::Basic, Some("Bio")).unwrap();
        assert_eq!(preview.new_count(), 5);
    }

    #[test]
    fn test_preview_marks_duplicates_and_lists_existing() {
        let store = FakeStore::default();
        store.notes.borrow_mut().push(("Bio".to_string(), "q2".to_string()));
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeGenerator::new(vec!["Q1", "Q2"]),
            store,
            5,
        );

        let preview = pipeline.prepare(&topic("cells"), CardStyle::Basic, Some("Bio")).unwrap();
        assert!(!preview.cards[0].is_duplicate);
        assert!(preview.cards[1].is_duplicate);
        assert_eq!(preview.duplicate_count(), 1);
        assert_eq!(*pipeline.generator().seen_existing.borrow(), vec!["q2".to_string()]);
    }

    #[test]
    fn test_submit_counts_every_presented_card() {
        let store = FakeStore::default();
        store.notes.borrow_mut().push(("Bio".to_string(), "Q1".to_string()));
        let pipeline = Pipeline::new(FakeFetcher { fail: false }, FakeGenerator::new(vec![]), store, 5);

        let cards: Vec<Card> = ["Q1", "Q2", "q2 ", "Q3"]
            .iter()
            .map(|f| Card::new(*f, "A").unwrap())
            .collect();
        let report = pipeline.submit("Bio", &cards).unwrap();
        assert_eq!(report, SubmitReport { added: 2, skipped: 2 });
        assert_eq!(report.total(), cards.len());
        assert!(pipeline.store().decks.borrow().contains(&"Bio".to_string()));
    }

    #[test]
    fn test_submit_skips_front_marked_duplicate_in_preview() {
        let store = FakeStore::default();
        store
            .notes
            .borrow_mut()
            .push(("Bio".to_string(), "what  is   atp?".to_string()));
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeGenerator::new(vec!["What is ATP?"]),
            store,
            5,
        );

        let preview = pipeline.prepare(&topic("atp"), CardStyle::Basic, Some("Bio")).unwrap();
        assert!(preview.cards[0].is_duplicate);
        // The exact-text lookup alone would miss this one
        assert!(!pipeline.store().is_duplicate("Bio", "What is ATP?").unwrap());

        let report = pipeline.submit("Bio", &preview.all_cards()).unwrap();
        assert_eq!(report, SubmitReport { added: 0, skipped: 1 });
        assert_eq!(pipeline.store().notes.borrow().len(), 1);
    }

    #[test]
    fn test_submit_is_idempotent_across_runs() {
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeGenerator::new(vec![]),
            FakeStore::default(),
            5,
        );
        let cards = vec![Card::new("What is ATP?", "Energy currency").unwrap()];

        assert_eq!(pipeline.submit("Bio", &cards).unwrap(), SubmitReport { added: 1, skipped: 0 });
        assert_eq!(pipeline.submit("Bio", &cards).unwrap(), SubmitReport { added: 0, skipped: 1 });
        assert_eq!(pipeline.store().notes.borrow().len(), 1);
    }

    #[test]
    fn test_store_rejection_counts_as_skip() {
        let store = FakeStore::default();
        store.racing.borrow_mut().push("Q2".to_string());
        let pipeline = Pipeline::new(FakeFetcher { fail: false }, FakeGenerator::new(vec![]), store, 5);

        let cards: Vec<Card> = ["Q1", "Q2"].iter().map(|f| Card::new(*f, "A").unwrap()).collect();
        let report = pipeline.submit("Bio", &cards).unwrap();
        assert_eq!(report, SubmitReport { added: 1, skipped: 1 });
    }

    #[test]
    fn test_store_down_fails_submit() {
        let store = FakeStore {
            down: true,
            ..FakeStore::default()
        };
        let pipeline = Pipeline::new(FakeFetcher { fail: false }, FakeGenerator::new(vec![]), store, 5);
        let cards = vec![Card::new("Q", "A").unwrap()];

        let err = pipeline.submit("Bio", &cards).unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(!pipeline.sync());
    }

    #[test]
    fn test_deck_choices_include_default() {
        let store = FakeStore::default();
        store.decks.borrow_mut().push("Zoology".to_string());
        let pipeline = Pipeline::new(FakeFetcher { fail: false }, FakeGenerator::new(vec![]), store, 5);
        assert_eq!(pipeline.deck_choices("LLM Flashcards"), vec!["LLM Flashcards", "Zoology"]);
    }
}
