//! OpenAI-compatible service for chat completions and embeddings.
//!
//! Minimal, non-streaming client. Two URL/auth layouts are supported:
//!
//! - **OpenAI** (`LlmProvider::OpenAI`), Bearer auth:
//!   - POST {endpoint}/v1/chat/completions
//!   - POST {endpoint}/v1/embeddings
//! - **Azure OpenAI** (`LlmProvider::AzureOpenAI`), `api-key` header, model = deployment:
//!   - POST {endpoint}/openai/deployments/{model}/chat/completions?api-version={v}
//!   - POST {endpoint}/openai/deployments/{model}/embeddings?api-version={v}
//!
//! Constructor validation:
//! - `cfg.provider` must be `OpenAI` or `AzureOpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.api_version` must be present for Azure
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    chat_message::ChatMessage,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, is_http_url,
        make_snippet,
    },
};

/// Thin client for OpenAI-compatible APIs.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    provider: Provider,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is Ollama
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `MissingApiVersion` for Azure without `api_version`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let provider = match cfg.provider {
            LlmProvider::OpenAI => Provider::OpenAI,
            LlmProvider::AzureOpenAI => Provider::AzureOpenAI,
            LlmProvider::Ollama => {
                return Err(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::InvalidProvider,
                )
                .into());
            }
        };

        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::new(provider, ProviderErrorKind::MissingApiKey))?;

        if !is_http_url(&cfg.endpoint) {
            return Err(ProviderError::new(
                provider,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        let (auth_name, auth_value) = match provider {
            Provider::AzureOpenAI => (
                header::HeaderName::from_static("api-key"),
                api_key.clone(),
            ),
            _ => (header::AUTHORIZATION, format!("Bearer {}", api_key)),
        };
        let mut auth_value = header::HeaderValue::from_str(&auth_value).map_err(|e| {
            ProviderError::new(
                provider,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        auth_value.set_sensitive(true);
        headers.insert(auth_name, auth_value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let (url_chat, url_embeddings) = endpoints_for(&cfg, provider)?;

        info!(
            provider = %provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            provider,
            url_chat,
            url_embeddings,
        })
    }

    /// Performs a **non-streaming** chat completion request.
    ///
    /// `temperature` overrides the configured value for this call only.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures (including timeouts)
    /// - `Decode` if the JSON cannot be parsed
    /// - `EmptyChoices` if no choice carries content
    #[instrument(skip_all, fields(provider = %self.provider, model = %self.cfg.model, messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, messages, temperature);

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
                "chat completions returned non-success status"
            );

            return Err(ProviderError::new(
                self.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode chat completions response"
                );
                return Err(ProviderError::new(
                    self.provider,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content.filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| ProviderError::new(self.provider, ProviderErrorKind::EmptyChoices))?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content)
    }

    /// Retrieves a single embeddings vector.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - `Decode` if the JSON cannot be parsed or `data` is empty
    #[instrument(skip_all, fields(provider = %self.provider, model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
        };

        debug!(input_len = input.len(), "POST {}", self.url_embeddings);

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

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "embeddings returned non-success status"
            );

            return Err(ProviderError::new(
                self.provider,
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
                self.provider,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `data[0].embedding`"
                )),
            )
        })?;

        let first = out.data.into_iter().next().ok_or_else(|| {
            ProviderError::new(
                self.provider,
                ProviderErrorKind::Decode("empty `data` in embeddings response".into()),
            )
        })?;

        debug!(
            latency_ms = started.elapsed().as_millis(),
            dim = first.embedding.len(),
            "embeddings completed"
        );

        Ok(first.embedding)
    }
}

/// Builds `(chat_url, embeddings_url)` for the provider's URL layout.
fn endpoints_for(cfg: &LlmModelConfig, provider: Provider) -> Result<(String, String), AiLlmError> {
    let base = cfg.base_url();
    match provider {
        Provider::AzureOpenAI => {
            let version = cfg
                .api_version
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ProviderError::new(provider, ProviderErrorKind::MissingApiVersion))?;
            let deployment = format!("{}/openai/deployments/{}", base, cfg.model.trim());
            Ok((
                format!("{deployment}/chat/completions?api-version={version}"),
                format!("{deployment}/embeddings?api-version={version}"),
            ))
        }
        _ => Ok((
            format!("{}/v1/chat/completions", base),
            format!("{}/v1/embeddings", base),
        )),
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Request body for chat completions (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(
        cfg: &'a LlmModelConfig,
        messages: &'a [ChatMessage],
        temperature: Option<f32>,
    ) -> Self {
        Self {
            model: &cfg.model,
            messages,
            temperature: temperature.or(cfg.temperature),
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

/// Minimal response for chat completions.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// Request body for embeddings.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body for embeddings.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}
