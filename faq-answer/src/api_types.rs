//! Public API types re-used by external crates (e.g., the HTTP API layer).

use faq_index::NotFoundReason;
use serde::{Deserialize, Serialize};

/// One earlier exchange supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Chronological, caller-owned conversation history.
pub type HistoryLog = Vec<ConversationTurn>;

/// Which branch produced the final text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// The chat model rewrote the FAQ answer.
    Enhanced,
    /// Enhancement failed; the FAQ answer is returned verbatim.
    Fallback,
}

/// Answer to a single query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub matched_question: Option<String>,
    pub matched_answer: Option<String>,
    pub enhanced_answer: String,
    pub source: AnswerSource,
    /// Squared L2 distance of the accepted match.
    pub distance: f32,
}

/// Terminal state of a request.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutcome {
    Answered(QueryResult),
    NotFound {
        query: String,
        reason: NotFoundReason,
    },
}
