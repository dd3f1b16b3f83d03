//! Health probes for the configured LLM backends.
//!
//! - Ollama: `GET {endpoint}/api/tags` (model presence is best-effort)
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth
//! - Azure OpenAI: `GET {endpoint}/openai/models?api-version=...` with `api-key`
//!
//! [`HealthService::check`] never fails: every error is folded into a
//! [`HealthStatus`] with `ok = false`, which is what `/health` wants.

use std::time::{Duration, Instant};

use reqwest::{RequestBuilder, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, Provider, is_http_url, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend name (e.g. "Ollama", "Azure OpenAI").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model or deployment the profile points at.
    pub model: Option<String>,
    pub ok: bool,
    /// Latency of the main probe in milliseconds.
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: Provider::from(cfg.provider).to_string(),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Minimal `{ "models": [ { "name": ... } ] }` shape from Ollama.
#[derive(Deserialize)]
struct OllamaTags {
    models: Option<Vec<OllamaTag>>,
}

#[derive(Deserialize)]
struct OllamaTag {
    name: String,
}

/// Minimal `{ "data": [ { "id": ... } ] }` shape shared by OpenAI and Azure.
#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelItem>,
}

#[derive(Deserialize)]
struct ModelItem {
    id: String,
}

/// Health checker reusing one HTTP client for all probes.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a health service with an optional client timeout (seconds, default 10).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        debug!(default_timeout_secs = timeout.as_secs(), "HealthService initialized");
        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks a single profile. Never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        if !is_http_url(&cfg.endpoint) {
            warn!(provider = ?cfg.provider, endpoint = %cfg.endpoint, "invalid endpoint");
            return HealthStatus::new(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.probe_ollama(cfg).await,
            LlmProvider::OpenAI | LlmProvider::AzureOpenAI => self.probe_model_list(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %cfg.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    model = %cfg.model,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks several profiles sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", cfg.base_url());
        let req = self.client.get(&url);
        let (resp, latency) = self.send(cfg, req, url).await?;

        match resp.json::<OllamaTags>().await {
            Ok(OllamaTags {
                models: Some(models),
            }) => {
                // Ollama tags carry a `:latest` suffix when none was given.
                let found = models
                    .iter()
                    .any(|m| m.name == cfg.model || m.name == format!("{}:latest", cfg.model));
                let msg = if found {
                    "model is available"
                } else {
                    "server is up, but model not found in /api/tags"
                };
                Ok(HealthStatus::new(cfg, found, latency, msg))
            }
            Ok(OllamaTags { models: None }) => Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                "server is up; tags response without `models` field",
            )),
            Err(e) => Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                format!("server is reachable; failed to decode /api/tags: {e}"),
            )),
        }
    }

    /// OpenAI and Azure both answer with an OpenAI-style model list.
    async fn probe_model_list(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or_else(|| HealthError::Decode("missing API key".into()))?;

        let (url, req) = match cfg.provider {
            LlmProvider::AzureOpenAI => {
                let version = cfg
                    .api_version
                    .as_deref()
                    .ok_or_else(|| HealthError::Decode("missing api-version".into()))?;
                let url = format!("{}/openai/models?api-version={version}", cfg.base_url());
                let req = self.client.get(&url).header("api-key", api_key);
                (url, req)
            }
            _ => {
                let url = format!("{}/v1/models", cfg.base_url());
                let req = self
                    .client
                    .get(&url)
                    .header(header::AUTHORIZATION, format!("Bearer {api_key}"));
                (url, req)
            }
        };

        let (resp, latency) = self.send(cfg, req, url).await?;

        match resp.json::<ModelList>().await {
            // Azure lists base models, not deployment names, so presence is only
            // meaningful for the public API.
            Ok(list) if cfg.provider == LlmProvider::OpenAI => {
                let found = list.data.iter().any(|m| m.id == cfg.model);
                let msg = if found {
                    "model is available"
                } else {
                    "server is up, but model not found in /v1/models"
                };
                Ok(HealthStatus::new(cfg, found, latency, msg))
            }
            Ok(_) => Ok(HealthStatus::new(cfg, true, latency, "deployment endpoint is reachable")),
            Err(e) => Ok(HealthStatus::new(
                cfg,
                true,
                latency,
                format!("server is reachable; failed to decode model list: {e}"),
            )),
        }
    }

    async fn send(
        &self,
        cfg: &LlmModelConfig,
        req: RequestBuilder,
        url: String,
    ) -> Result<(reqwest::Response, u128), AiLlmError> {
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        debug!(provider = ?cfg.provider, "GET {}", url);
        let start = Instant::now();
        let resp = req.timeout(timeout).send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(%url, %status, %snippet, latency_ms = latency, "health probe returned non-success status");
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })
            .into());
        }
        Ok((resp, latency))
    }
}
