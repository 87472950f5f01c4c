use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Model endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("Ollama returned an empty response. Is the model running? Try: ollama list")]
    EmptyResponse,

    #[error("Invalid response from model endpoint: {0}")]
    InvalidResponse(String),

    #[error("Parsed 0 cards from model response. First 500 chars: {snippet:?}")]
    NoParseableCards { snippet: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
