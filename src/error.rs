//! Error types for Kikitori.

use thiserror::Error;

/// Library-level error type for Kikitori operations.
#[derive(Error, Debug)]
pub enum KikitoriError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Transcript not available: {0}")]
    TranscriptUnavailable(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Quiz error: {0}")]
    Quiz(String),

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

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Kikitori operations.
pub type Result<T> = std::result::Result<T, KikitoriError>;
