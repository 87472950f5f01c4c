use anyhow::{bail, Result};

use antor_lib::pipeline::{CardGenerator, DocumentFetcher, NoteStore};
use antor_lib::{CardStyle, Pipeline, Preview, SourceRequest, SubmitReport};

use crate::app::App;
use crate::render::terminal as renderer;
use crate::OutputFormat;

pub struct GenerateOptions {
    pub request: SourceRequest,
    pub style: CardStyle,
    pub deck: String,
    /// Submit after the preview
    pub add: bool,
    pub sync: bool,
}

/// What a run produced
pub struct GenerateOutcome {
    pub preview: Preview,
    pub report: Option<SubmitReport>,
    /// `None` when no sync was asked for
    pub synced: Option<bool>,
}

/// Preview, then optionally submit and sync.
///
/// Preview-only runs never contact the store. With `add`, an unreachable
/// store aborts before anything is generated.
pub fn execute<F, G, S>(pipeline: &Pipeline<F, G, S>, options: &GenerateOptions) -> Result<GenerateOutcome>
where
    F: DocumentFetcher,
    G: CardGenerator,
    S: NoteStore,
{
    if options.add && !pipeline.store().is_reachable() {
        bail!("Store unavailable: Anki is not reachable. Is Anki running with the AnkiConnect add-on?");
    }

    let marking_deck = options.add.then_some(options.deck.as_str());
    let preview = pipeline.prepare(&options.request, options.style, marking_deck)?;

    let report = if options.add {
        Some(pipeline.submit(&options.deck, &preview.all_cards())?)
    } else {
        None
    };
    let synced = (options.add && options.sync).then(|| pipeline.sync());

    Ok(GenerateOutcome {
        preview,
        report,
        synced,
    })
}

pub fn run(app: &App, options: &GenerateOptions, format: &OutputFormat, use_color: bool) -> Result<()> {
    if matches!(format, OutputFormat::Plain) {
        eprintln!(
            "Generating {} {} cards via Ollama ({})...",
            app.config.cards_per_run,
            options.style.label(),
            app.ollama().model()
        );
    }

    let GenerateOutcome {
        preview,
        report,
        synced,
    } = execute(&app.pipeline, options)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "source": {
                    "kind": preview.document.kind,
                    "title": preview.document.title,
                },
                "style": preview.style,
                "deck": options.deck,
                "cards": preview.cards,
                "report": report,
                "synced": synced,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", renderer::render_preview(&preview, options.add, use_color));
            println!();
            match report {
                Some(report) => {
                    println!("{}", renderer::render_report(&report, &options.deck, use_color));
                    match synced {
                        Some(true) => println!("Synced with AnkiWeb."),
                        Some(false) => eprintln!(
                            "{}",
                            renderer::render_error("Sync failed (see log for details).", use_color)
                        ),
                        None => {}
                    }
                }
                None => println!("Run with --add to add these cards to Anki."),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashSet;

    use antor_lib::generation::{GenerationError, GenerationRequest};
    use antor_lib::sources::SourceError;
    use antor_lib::store::{AddOutcome, StoreError};
    use antor_lib::{Card, SourceDocument, SourceKind};

    use super::*;

    struct TopicFetcher;

    impl DocumentFetcher for TopicFetcher {
        fn fetch(&self, request: &SourceRequest) -> std::result::Result<SourceDocument, SourceError> {
            let SourceRequest::Topic(topic) = request else {
                return Err(SourceError::InvalidInput("topics only".to_string()));
            };
            Ok(SourceDocument {
                title: topic.clone(),
                body: topic.clone(),
                kind: SourceKind::Topic,
            })
        }
    }

    struct TwoCards;

    impl CardGenerator for TwoCards {
        fn generate(&self, _request: &GenerationRequest<'_>) -> std::result::Result<Vec<Card>, GenerationError> {
            Ok(["What is osmosis?", "What is a solute?"]
                .iter()
                .filter_map(|f| Card::new(*f, "Water crossing a membrane"))
                .collect())
        }
    }

    /// Counts every call; every call fails while `down`
    #[derive(Default)]
    struct CountingStore {
        down: bool,
        calls: Cell<usize>,
        syncs: Cell<usize>,
    }

    impl CountingStore {
        fn touch(&self) -> std::result::Result<(), StoreError> {
            self.calls.set(self.calls.get() + 1);
            if self.down {
                return Err(StoreError::Unavailable {
                    url: "http://127.0.0.1:8765".to_string(),
                    message: "connection refused".to_string(),
                });
            }
            Ok(())
        }
    }

    impl NoteStore for CountingStore {
        fn is_reachable(&self) -> bool {
            self.touch().is_ok()
        }

        fn deck_names(&self) -> std::result::Result<Vec<String>, StoreError> {
            self.touch().map(|_| Vec::new())
        }

        fn create_deck(&self, _deck: &str) -> std::result::Result<(), StoreError> {
            self.touch()
        }

        fn existing_fronts(&self, _deck: &str) -> std::result::Result<HashSet<String>, StoreError> {
            self.touch().map(|_| HashSet::new())
        }

        fn is_duplicate(&self, _deck: &str, _front: &str) -> std::result::Result<bool, StoreError> {
            self.touch().map(|_| false)
        }

        fn add_notes(&self, _deck: &str, cards: &[Card]) -> std::result::Result<Vec<AddOutcome>, StoreError> {
            self.touch()?;
            Ok(cards.iter().map(|_| AddOutcome::Added(None)).collect())
        }

        fn sync(&self) -> std::result::Result<(), StoreError> {
            self.syncs.set(self.syncs.get() + 1);
            self.touch()
        }
    }

    fn pipeline(store: CountingStore) -> Pipeline<TopicFetcher, TwoCards, CountingStore> {
        Pipeline::new(TopicFetcher, TwoCards, store, 5)
    }

    fn options(add: bool, sync: bool) -> GenerateOptions {
        GenerateOptions {
            request: SourceRequest::Topic("osmosis".to_string()),
            style: CardStyle::Basic,
            deck: "Bio".to_string(),
            add,
            sync,
        }
    }

    #[test]
    fn test_preview_only_shows_cards_with_store_down() {
        let pipeline = pipeline(CountingStore {
            down: true,
            ..CountingStore::default()
        });

        let outcome = execute(&pipeline, &options(false, false)).unwrap();
        assert_eq!(outcome.preview.cards.len(), 2);
        assert!(outcome.report.is_none());
        assert_eq!(pipeline.store().calls.get(), 0);
    }

    #[test]
    fn test_add_aborts_when_store_down() {
        let pipeline = pipeline(CountingStore {
            down: true,
            ..CountingStore::default()
        });

        let err = execute(&pipeline, &options(true, true)).err().unwrap();
        assert!(err.to_string().contains("Store unavailable"));
        assert_eq!(pipeline.store().syncs.get(), 0);
    }

    #[test]
    fn test_add_submits_and_syncs_on_request() {
        let pipeline = pipeline(CountingStore::default());

        let outcome = execute(&pipeline, &options(true, false)).unwrap();
        assert_eq!(outcome.report, Some(SubmitReport { added: 2, skipped: 0 }));
        assert_eq!(outcome.synced, None);
        assert_eq!(pipeline.store().syncs.get(), 0);

        let outcome = execute(&pipeline, &options(true, true)).unwrap();
        assert_eq!(outcome.synced, Some(true));
        assert_eq!(pipeline.store().syncs.get(), 1);
    }

    #[test]
    fn test_sync_without_add_is_ignored() {
        let pipeline = pipeline(CountingStore::default());

        let outcome = execute(&pipeline, &options(false, true)).unwrap();
        assert_eq!(outcome.synced, None);
        assert_eq!(pipeline.store().calls.get(), 0);
    }
}
