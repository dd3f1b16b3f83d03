use faq_answer::ConversationTurn;
use serde::{Deserialize, Serialize};

/// Request payload for /get_faq_response.
#[derive(Debug, Deserialize)]
pub struct FaqRequest {
    /// Free-text user question.
    pub query: String,
    /// Earlier turns of this conversation, oldest first.
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

/// Response payload for /get_faq_response.
#[derive(Debug, Serialize)]
pub struct FaqResponse {
    pub query: String,
    pub enhanced_response: String,
}
