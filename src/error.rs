//! Error types for Referat.

use thiserror::Error;

/// Library-level error type for Referat operations.
#[derive(Error, Debug)]
pub enum ReferatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing capability: {0}")]
    Capability(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Action item extraction failed: {0}")]
    ActionExtraction(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ReferatError {
    /// Whether this error is a missing-capability condition (absent credential,
    /// unsupported provider) as opposed to a runtime failure.
    pub fn is_capability(&self) -> bool {
        matches!(self, ReferatError::Capability(_))
    }
}

/// Result type alias for Referat operations.
pub type Result<T> = std::result::Result<T, ReferatError>;
