//! Source-text fetching: topics, YouTube transcripts and web articles
//!
//! Each source produces a `SourceDocument` (display title plus body text) that
//! the generation client turns into a prompt.

pub mod article;
pub mod errors;
pub mod youtube;

use std::fmt;

use reqwest::blocking::Client;
use serde::Serialize;

pub use errors::{Result, SourceError};

use crate::config::AppConfig;
use crate::text::truncate_chars;

/// Appended to transcripts and articles cut to the configured length
pub const TRUNCATION_MARKER: &str = "\n\n[Transcript truncated for length.]";

/// Where the study material comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    Topic(String),
    /// Video URL or bare id
    Transcript(String),
    /// Article URL
    Article(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Topic,
    Transcript,
    Article,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Topic => "topic",
            Self::Transcript => "transcript",
            Self::Article => "article",
        };
        f.write_str(name)
    }
}

/// Fetched study material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDocument {
    pub title: String,
    pub body: String,
    pub kind: SourceKind,
}

/// Turn unicode space-like characters into plain spaces and collapse runs.
///
/// Topics pasted from web pages often carry NBSP or em spaces.
pub fn normalize_topic(topic: &str) -> String {
    topic
        .chars()
        .map(|c| match c {
            '\u{00a0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' | '\u{feff}' => ' ',
            other => other,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetches source documents over a shared blocking HTTP client
pub struct SourceFetcher {
    client: Client,
    youtube_base_url: String,
    language: String,
    max_chars: usize,
}

impl SourceFetcher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent("Mozilla/5.0 (compatible; Antor/1.0)")
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            youtube_base_url: youtube::YOUTUBE_BASE_URL.to_string(),
            language: config.transcript_language.clone(),
            max_chars: config.max_transcript_chars,
        })
    }

    /// Point YouTube requests somewhere else (a mirror or a local stub)
    pub fn with_youtube_base_url(mut self, url: impl Into<String>) -> Self {
        self.youtube_base_url = url.into();
        self
    }

    pub fn fetch(&self, request: &SourceRequest) -> Result<SourceDocument> {
        match request {
            SourceRequest::Topic(topic) => {
                let topic = normalize_topic(topic);
                if topic.is_empty() {
                    return Err(SourceError::InvalidInput("Enter a topic.".to_string()));
                }
                Ok(SourceDocument {
                    title: topic.clone(),
                    body: topic,
                    kind: SourceKind::Topic,
                })
            }
            SourceRequest::Transcript(input) => {
                if input.trim().is_empty() {
                    return Err(SourceError::InvalidInput("Enter a YouTube URL.".to_string()));
                }
                let video_id = youtube::extract_video_id(input).ok_or_else(|| {
                    SourceError::InvalidInput(
                        "Could not find a YouTube video ID in that URL. Use a link like https://www.youtube.com/watch?v=...".to_string(),
                    )
                })?;
                let transcript = youtube::fetch_transcript(
                    &self.client,
                    &self.youtube_base_url,
                    &video_id,
                    &self.language,
                )?;
                Ok(SourceDocument {
                    title: transcript.title,
                    body: self.truncate(&transcript.text),
                    kind: SourceKind::Transcript,
                })
            }
            SourceRequest::Article(url) => {
                let article = article::fetch_article(&self.client, url)?;
                Ok(SourceDocument {
                    title: article.title,
                    body: self.truncate(&article.text),
                    kind: SourceKind::Article,
                })
            }
        }
    }

    fn truncate(&self, text: &str) -> String {
        let truncated = truncate_chars(text, self.max_chars, TRUNCATION_MARKER);
        if truncated.len() != text.len() {
            log::info!("Source text truncated to {} characters", self.max_chars);
        }
        truncated
    }
}
