//! Flashcard generation for Anki from topics, YouTube transcripts and articles,
//! using a local Ollama model.

pub mod cards;
pub mod config;
pub mod generation;
pub mod pipeline;
pub mod sources;
pub mod store;
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use cards::{Card, CardStyle, PreviewCard, SubmitReport};
pub use config::AppConfig;
pub use pipeline::{Pipeline, PipelineError, Preview, ServicePipeline};
pub use sources::{SourceDocument, SourceKind, SourceRequest};
