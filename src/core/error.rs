use thiserror::Error;

/// Top-level error type for the discovery engine.
///
/// Reranker failures never appear here: they are absorbed at the adapter
/// boundary and degrade to an empty ranking.
#[derive(Error, Debug)]
pub enum ModScoutError {
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ModScoutError>;
