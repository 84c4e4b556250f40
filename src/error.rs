//! Error types for Corso.

use thiserror::Error;

/// Library-level error type for Corso operations.
#[derive(Error, Debug)]
pub enum CorsoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document processing failed: {0}")]
    Document(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Anthropic API error: {0}")]
    Anthropic(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

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

/// Result type alias for Corso operations.
pub type Result<T> = std::result::Result<T, CorsoError>;
