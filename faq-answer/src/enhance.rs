//! Answer enhancement with graceful fallback.

use std::sync::Arc;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::api_types::{AnswerSource, ConversationTurn};
use crate::cfg::EnhancerConfig;
use crate::dedup::dedup_sentences;
use crate::error::EnhancementError;
use crate::llm::ChatBackend;
use crate::prompt::build_messages;

/// Rewrites a retrieved FAQ answer with the chat model.
#[derive(Clone)]
pub struct Enhancer {
    chat: Arc<dyn ChatBackend>,
    cfg: EnhancerConfig,
}

impl std::fmt::Debug for Enhancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enhancer").field("cfg", &self.cfg).finish()
    }
}

impl Enhancer {
    pub fn new(chat: Arc<dyn ChatBackend>, cfg: EnhancerConfig) -> Self {
        Self { chat, cfg }
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.cfg
    }

    /// One enhancement with retries; every failure kind is an error here.
    ///
    /// # Errors
    /// The last attempt's [`EnhancementError`].
    pub async fn try_enhance(
        &self,
        question: &str,
        answer: &str,
        history: &[ConversationTurn],
    ) -> Result<String, EnhancementError> {
        let messages = build_messages(
            &self.cfg.system_prompt,
            question,
            answer,
            history,
            self.cfg.history_limit,
        );

        let mut attempt = 1;
        loop {
            match self.attempt(&messages).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.cfg.attempts => {
                    debug!(attempt, error = %e, "enhancement attempt failed; retrying");
                    sleep(self.cfg.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Enhanced text, or `answer` unchanged if enhancement fails.
    pub async fn enhance(
        &self,
        question: &str,
        answer: &str,
        history: &[ConversationTurn],
    ) -> String {
        self.enhance_with_source(question, answer, history).await.0
    }

    /// Like [`Enhancer::enhance`], also reporting which branch was taken.
    pub async fn enhance_with_source(
        &self,
        question: &str,
        answer: &str,
        history: &[ConversationTurn],
    ) -> (String, AnswerSource) {
        match self.try_enhance(question, answer, history).await {
            Ok(text) => (text, AnswerSource::Enhanced),
            Err(e) => {
                warn!(error = %e, "enhancement failed; returning FAQ answer unchanged");
                (answer.to_string(), AnswerSource::Fallback)
            }
        }
    }

    async fn attempt(
        &self,
        messages: &[ai_llm_service::chat_message::ChatMessage],
    ) -> Result<String, EnhancementError> {
        let raw = timeout(
            self.cfg.timeout,
            self.chat.complete(messages, self.cfg.temperature),
        )
        .await
        .map_err(|_| EnhancementError::Timeout(self.cfg.timeout))??;

        let trimmed = raw.trim();
        let text = if self.cfg.dedup_sentences {
            dedup_sentences(trimmed)
        } else {
            trimmed.to_string()
        };
        if text.trim().is_empty() {
            return Err(EnhancementError::EmptyCompletion);
        }
        Ok(text)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted chat doubles shared by the crate's tests.

    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use ai_llm_service::chat_message::ChatMessage;

    use super::*;

    pub enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    /// Replays `replies` in order and records every prompt it receives.
    pub struct ScriptedChat {
        replies: Mutex<VecDeque<Reply>>,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        pub fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChatBackend for ScriptedChat {
        fn complete<'a>(
            &'a self,
            messages: &'a [ChatMessage],
            _temperature: f32,
        ) -> Pin<Box<dyn Future<Output = Result<String, EnhancementError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(messages.to_vec());
            let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Fail);
            Box::pin(async move {
                match reply {
                    Reply::Text(t) => Ok(t.to_string()),
                    Reply::Fail => Err(EnhancementError::Provider("HTTP 503".into())),
                    Reply::Hang => {
                        sleep(Duration::from_secs(30)).await;
                        Ok("too late".into())
                    }
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::testing::*;
    use super::*;

    fn enhancer(chat: Arc<ScriptedChat>, cfg: EnhancerConfig) -> Enhancer {
        Enhancer::new(chat, cfg)
    }

    fn fast_cfg() -> EnhancerConfig {
        EnhancerConfig {
            timeout: Duration::from_millis(50),
            retry_backoff: Duration::from_millis(1),
            ..EnhancerConfig::default()
        }
    }

    #[tokio::test]
    async fn successful_completion_is_trimmed_and_deduped() {
        let chat = Arc::new(ScriptedChat::new(vec![Reply::Text(
            "  It is a virus. It is a virus. It spreads by droplets.  ",
        )]));
        let e = enhancer(chat.clone(), fast_cfg());
        let (text, src) = e
            .enhance_with_source("What is COVID-19?", "A viral respiratory illness.", &[])
            .await;
        assert_eq!(text, "It is a virus. It spreads by droplets.");
        assert_eq!(src, AnswerSource::Enhanced);
        assert_eq!(chat.seen.lock().unwrap()[0].len(), 3);
    }

    #[tokio::test]
    async fn provider_error_falls_back_to_original() {
        let chat = Arc::new(ScriptedChat::new(vec![Reply::Fail]));
        let e = enhancer(chat, fast_cfg());
        let out = e.enhance("q", "A viral respiratory illness.", &[]).await;
        assert_eq!(out, "A viral respiratory illness.");
    }

    #[tokio::test]
    async fn timeout_falls_back_to_original() {
        let chat = Arc::new(ScriptedChat::new(vec![Reply::Hang]));
        let e = enhancer(chat, fast_cfg());
        let err = e.try_enhance("q", "a", &[]).await.unwrap_err();
        assert!(matches!(err, EnhancementError::Timeout(_)));

        let chat = Arc::new(ScriptedChat::new(vec![Reply::Hang]));
        let e = enhancer(chat, fast_cfg());
        assert_eq!(e.enhance("q", "original", &[]).await, "original");
    }

    #[tokio::test]
    async fn blank_completion_is_an_error() {
        let chat = Arc::new(ScriptedChat::new(vec![Reply::Text("   ")]));
        let e = enhancer(chat, fast_cfg());
        let err = e.try_enhance("q", "a", &[]).await.unwrap_err();
        assert!(matches!(err, EnhancementError::EmptyCompletion));
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Reply::Fail,
            Reply::Text("Recovered."),
        ]));
        let e = enhancer(
            chat.clone(),
            EnhancerConfig {
                attempts: 2,
                ..fast_cfg()
            },
        );
        assert_eq!(e.enhance("q", "a", &[]).await, "Recovered.");
        assert_eq!(chat.calls(), 2);

        let chat = Arc::new(ScriptedChat::new(vec![Reply::Fail, Reply::Fail, Reply::Fail]));
        let e = enhancer(
            chat.clone(),
            EnhancerConfig {
                attempts: 2,
                ..fast_cfg()
            },
        );
        assert_eq!(e.enhance("q", "a", &[]).await, "a");
        assert_eq!(chat.calls(), 2);
    }

    #[tokio::test]
    async fn dedup_can_be_disabled() {
        let chat = Arc::new(ScriptedChat::new(vec![Reply::Text("A. A")]));
        let e = enhancer(
            chat,
            EnhancerConfig {
                dedup_sentences: false,
                ..fast_cfg()
            },
        );
        assert_eq!(e.enhance("q", "a", &[]).await, "A. A");
    }
}
