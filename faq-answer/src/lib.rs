//! FAQ answering pipeline on top of `faq-index`.
//!
//! Public entry point: [`ServiceContext::answer`]. It validates the caller's
//! history, embeds the query, retrieves the nearest FAQ entry under the
//! configured policy, and asks the chat model to refine the answer. When the
//! chat call fails the FAQ answer is returned unchanged.

pub mod api_types;
pub mod cfg;
pub mod dedup;
pub mod enhance;
mod error;
pub mod handler;
pub mod llm;
pub mod prompt;

pub use api_types::{AnswerSource, ConversationTurn, HistoryLog, QueryOutcome, QueryResult};
pub use cfg::EnhancerConfig;
pub use enhance::Enhancer;
pub use error::{AnswerError, EnhancementError};
pub use handler::ServiceContext;
pub use llm::ChatBackend;
