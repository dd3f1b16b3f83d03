//! Typed errors for the answering pipeline.

use std::time::Duration;

use ai_llm_service::error_handler::AiLlmError;
use faq_index::IndexError;
use thiserror::Error;

/// Why an enhancement attempt produced no usable text.
///
/// Never escapes [`crate::enhance::Enhancer::enhance`]; it becomes the fallback.
#[derive(Debug, Error)]
pub enum EnhancementError {
    /// Transport, status or decode failure from the chat provider.
    #[error("chat provider failed: {0}")]
    Provider(String),

    /// The call did not finish within the configured timeout.
    #[error("chat call timed out after {0:?}")]
    Timeout(Duration),

    /// Provider answered, but with nothing usable after post-processing.
    #[error("chat completion was empty")]
    EmptyCompletion,
}

impl From<AiLlmError> for EnhancementError {
    fn from(e: AiLlmError) -> Self {
        match e {
            AiLlmError::Timeout(d) => EnhancementError::Timeout(d),
            other => EnhancementError::Provider(other.to_string()),
        }
    }
}

/// Errors surfaced by the request handler and service bootstrap.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// A history turn is malformed; rejected before any work.
    #[error("invalid history turn {index}: {reason}")]
    InvalidHistory { index: usize, reason: &'static str },

    /// The query could not be embedded.
    #[error("query embedding failed: {0}")]
    Embedding(#[source] IndexError),

    /// Search failed (e.g. query width differs from the index).
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] IndexError),

    /// Index loading or model probing failed at startup.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// LLM configuration problems at startup.
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    /// Invalid answering configuration.
    #[error("config error: {0}")]
    Config(String),
}
