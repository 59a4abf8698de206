//! Error types for Charla.

use thiserror::Error;

/// Library-level error type for Charla operations.
///
/// Callers can tell the retrieval-stage failure (`NoContext`, suggests
/// re-ingesting data) apart from parse-stage failures (`MalformedResponse`,
/// `Validation`, suggest retrying generation).
#[derive(Error, Debug)]
pub enum CharlaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Model response is not valid JSON: {0}")]
    MalformedResponse(String),

    #[error("Model response is missing required fields: {0}")]
    Validation(String),

    #[error("No grounding context available: {0}")]
    NoContext(String),

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

    #[error("Transcript not found: {0}")]
    TranscriptNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Charla operations.
pub type Result<T> = std::result::Result<T, CharlaError>;
