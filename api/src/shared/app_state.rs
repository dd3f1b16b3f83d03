use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use faq_answer::ServiceContext;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded index, retriever, embedder and enhancer.
    pub ctx: Arc<ServiceContext>,
    /// LLM profiles probed by `/health`; `None` skips provider checks.
    pub llm: Option<Arc<LlmServiceProfiles>>,
}

impl AppState {
    pub fn new(ctx: Arc<ServiceContext>, llm: Option<Arc<LlmServiceProfiles>>) -> Self {
        Self { ctx, llm }
    }
}
