use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Could not fetch {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("URL does not return HTML content ({0})")]
    NotHtml(String),

    #[error("No transcript available: {0}")]
    NoTranscript(String),

    #[error("Video is unavailable or private.")]
    VideoUnavailable,

    #[error("No article text could be extracted from this URL (not an article page or unsupported format).")]
    NoContent,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SourceError>;

impl SourceError {
    pub(crate) fn unreachable(url: &str, message: impl ToString) -> Self {
        Self::Unreachable {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}
