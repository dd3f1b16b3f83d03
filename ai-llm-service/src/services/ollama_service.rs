//! Lightweight Ollama service for chat completions and embeddings.
//!
//! This module implements a thin client for the Ollama API:
//! - `POST {endpoint}/api/chat`       : non-streaming chat completion
//! - `POST {endpoint}/api/embeddings` : embeddings retrieval
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::chat_message::ChatMessage;
//! use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "llama3".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     api_version: None,
//!     max_tokens: Some(256),
//!     temperature: Some(0.5),
//!     top_p: None,
//!     timeout_secs: Some(30),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.chat(&[ChatMessage::user("Say hi.")], None).await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::chat_message::{ChatMessage, ChatRole};
use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, is_http_url, make_snippet,
};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is not http/https
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        if !is_http_url(&cfg.endpoint) {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .brotli(true)
            .build()?;

        let base = cfg.base_url();
        let url_chat = format!("{}/api/chat", base);
        let url_embeddings = format!("{}/api/embeddings", base);

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embeddings,
        })
    }

    /// Performs a **non-streaming** chat request via `/api/chat`.
    ///
    /// `temperature` overrides the configured value for this call only.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors (including timeouts)
    /// - `Decode` if the response cannot be parsed
    /// - `EmptyChoices` if the reply has no message content
    #[instrument(skip_all, fields(model = %self.cfg.model, messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatRequest::from_cfg(&self.cfg, messages, temperature);

        debug!("POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Ollama /api/chat returned non-success status"
            );
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: ChatResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; ensure `stream=false` is used"
                )),
            )
        })?;

        let content = out
            .message
            .map(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyChoices))?;

        debug!(
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );
        Ok(content)
    }

    /// Retrieves embeddings via `/api/embeddings`.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors
    /// - `Decode` if the response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `{{ embedding: number[] }}`"
                )),
            )
        })?;

        Ok(out.embedding)
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

impl<'a> ChatRequest<'a> {
    fn from_cfg(
        cfg: &'a LlmModelConfig,
        messages: &'a [ChatMessage],
        temperature: Option<f32>,
    ) -> Self {
        let options = ChatOptions {
            temperature: temperature.or(cfg.temperature),
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            messages: messages
                .iter()
                .map(|m| OllamaMessage {
                    role: role_str(m.role),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            options: Some(options),
        }
    }
}

fn role_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/chat`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<OutMessage>,
}

#[derive(Debug, Deserialize)]
struct OutMessage {
    content: String,
}

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}
