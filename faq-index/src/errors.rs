//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for faq-index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus / lookup JSON parsing errors.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// One of the two persisted artifacts does not exist.
    #[error("index artifact not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    /// Artifacts exist but disagree with each other or fail to decode.
    #[error("index is corrupt: {0}")]
    IndexCorrupt(String),

    /// No usable rows remained after filtering the corpus.
    #[error("corpus is empty after filtering; nothing to index")]
    CorpusEmpty,

    /// Embeddings of different widths within one build.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Query vector width differs from the index width.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding model cannot be reached or answers with an unusable vector.
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// A single embedding call failed.
    #[error("embedding failed: {0}")]
    Embedding(String),
}

impl From<ai_llm_service::error_handler::AiLlmError> for IndexError {
    fn from(e: ai_llm_service::error_handler::AiLlmError) -> Self {
        IndexError::Embedding(e.to_string())
    }
}
