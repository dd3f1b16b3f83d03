//! Chat seam used by the enhancer.

use std::{future::Future, pin::Pin};

use ai_llm_service::chat_message::ChatMessage;
use ai_llm_service::service_profiles::LlmServiceProfiles;

use crate::error::EnhancementError;

/// Anything that can turn role-tagged messages into one completion.
///
/// Implemented for the shared [`LlmServiceProfiles`]; tests plug in
/// in-memory doubles.
pub trait ChatBackend: Send + Sync {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        temperature: f32,
    ) -> Pin<Box<dyn Future<Output = Result<String, EnhancementError>> + Send + 'a>>;
}

impl ChatBackend for LlmServiceProfiles {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        temperature: f32,
    ) -> Pin<Box<dyn Future<Output = Result<String, EnhancementError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.chat(messages, Some(temperature)).await?) })
    }
}
