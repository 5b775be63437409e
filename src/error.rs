//! Error types for docqa.

use thiserror::Error;

/// Library-level error type for docqa operations.
#[derive(Error, Debug)]
pub enum DocqaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index was built with embedding model '{indexed}' but the query embedder is '{query}'")]
    EmbeddingMismatch { indexed: String, query: String },

    #[error("Unknown document_id: {0}")]
    UnknownHandle(String),

    #[error("No document has been indexed yet")]
    NoIndex,

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

impl DocqaError {
    /// Whether the caller is at fault (bad input, unknown handle, nothing indexed).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocqaError::Config(_)
                | DocqaError::InvalidSource(_)
                | DocqaError::SourceNotFound(_)
                | DocqaError::EmptyInput(_)
                | DocqaError::UnknownHandle(_)
                | DocqaError::NoIndex
        )
    }

    /// Whether a retry of the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DocqaError::Extraction(_)
                | DocqaError::Generation(_)
                | DocqaError::Http(_)
                | DocqaError::OpenAI(_)
        )
    }
}

/// Result type alias for docqa operations.
pub type Result<T> = std::result::Result<T, DocqaError>;
