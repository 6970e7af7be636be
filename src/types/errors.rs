//! Error types for the suggestion engine.

use thiserror::Error;

/// Standard result type for the crate.
pub type SuggestResult<T> = Result<T, SuggestError>;

/// Errors produced while generating or recording suggestions.
#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("registry storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("decryption failed for field '{0}'")]
    Decryption(String),

    #[error("learned-pattern store error: {0}")]
    LearningStore(String),

    #[error("reranker timed out after {0}s")]
    RerankerTimeout(u64),

    #[error("reranker failed: {0}")]
    RerankerFailed(String),

    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl SuggestError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
