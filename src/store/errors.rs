use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Anki is not reachable at {url}. Is Anki running with AnkiConnect installed? ({message})")]
    Unavailable { url: String, message: String },

    #[error("AnkiConnect error: {0}")]
    Api(String),

    #[error("Invalid response from AnkiConnect: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
