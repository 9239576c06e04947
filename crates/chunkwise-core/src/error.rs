//! Error types for Chunkwise.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Extraction service error: {0}")]
    ExtractionService(String),

    #[error("Index build error: {0}")]
    IndexBuild(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, Error>;
