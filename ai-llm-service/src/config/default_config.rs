//! Default LLM configs loaded strictly from environment variables.
//!
//! Two roles are resolved here:
//!
//! - **Chat**      → the completion model used to refine retrieved answers
//! - **Embedding** → the text-to-vector model used for indexing and queries
//!
//! # Environment variables
//!
//! Chat:
//! - `LLM_KIND`          = `ollama` (default) | `openai` | `azure`
//! - `CHAT_MODEL`        = model or Azure deployment name (mandatory)
//! - `CHAT_ENDPOINT`     = base URL; Ollama falls back to `OLLAMA_URL` / `OLLAMA_PORT`
//! - `CHAT_API_KEY`      = mandatory for `openai` and `azure`
//! - `CHAT_API_VERSION`  = Azure `api-version` (default `2024-02-01`)
//!
//! Embedding (each falls back to its chat counterpart when unset):
//! - `EMBEDDING_KIND`, `EMBEDDING_MODEL` (mandatory), `EMBEDDING_ENDPOINT`,
//!   `EMBEDDING_API_KEY`, `EMBEDDING_API_VERSION`
//!
//! Common:
//! - `LLM_MAX_TOKENS`   = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = request timeout (default 60)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt},
};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Constructs the **chat** profile from the process environment.
///
/// # Defaults
/// - `temperature = None` (set per request by the caller)
/// - `timeout_secs = Some(60)`
///
/// # Errors
/// - [`ConfigError::MissingVar`] for a missing model, Azure endpoint, or API key
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
pub fn config_chat_from_env() -> Result<LlmModelConfig, AiLlmError> {
    config_chat_with(&env_opt)
}

/// Constructs the **embedding** profile from the process environment.
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `max_tokens = None`
pub fn config_embedding_from_env() -> Result<LlmModelConfig, AiLlmError> {
    config_embedding_with(&env_opt)
}

/// Chat profile resolved through an arbitrary variable lookup.
pub fn config_chat_with(
    get: &dyn Fn(&str) -> Option<String>,
) -> Result<LlmModelConfig, AiLlmError> {
    let provider = match get("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::Ollama,
    };
    let model = get("CHAT_MODEL").ok_or(ConfigError::MissingVar("CHAT_MODEL"))?;
    let endpoint = resolve_endpoint(provider, get("CHAT_ENDPOINT"), get, "CHAT_ENDPOINT")?;
    let api_key = resolve_api_key(provider, get("CHAT_API_KEY"), "CHAT_API_KEY")?;
    let api_version = resolve_api_version(provider, get("CHAT_API_VERSION"));

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        api_version,
        max_tokens: parse_u32(get, "LLM_MAX_TOKENS")?,
        temperature: None,
        top_p: None,
        timeout_secs: Some(parse_u64(get, "LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Embedding profile resolved through an arbitrary variable lookup.
///
/// Unset `EMBEDDING_*` variables inherit the corresponding chat variable so a
/// single-provider deployment only has to name the embedding model.
pub fn config_embedding_with(
    get: &dyn Fn(&str) -> Option<String>,
) -> Result<LlmModelConfig, AiLlmError> {
    let provider = match get("EMBEDDING_KIND").or_else(|| get("LLM_KIND")) {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::Ollama,
    };
    let model = get("EMBEDDING_MODEL").ok_or(ConfigError::MissingVar("EMBEDDING_MODEL"))?;
    let explicit = get("EMBEDDING_ENDPOINT").or_else(|| get("CHAT_ENDPOINT"));
    let endpoint = resolve_endpoint(provider, explicit, get, "EMBEDDING_ENDPOINT")?;
    let api_key = resolve_api_key(
        provider,
        get("EMBEDDING_API_KEY").or_else(|| get("CHAT_API_KEY")),
        "EMBEDDING_API_KEY",
    )?;
    let api_version = resolve_api_version(
        provider,
        get("EMBEDDING_API_VERSION").or_else(|| get("CHAT_API_VERSION")),
    );

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        api_version,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(parse_u64(get, "LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Resolves the endpoint for a provider.
///
/// Precedence for Ollama:
/// 1. explicit endpoint variable
/// 2. `OLLAMA_URL`
/// 3. `OLLAMA_PORT` → `http://localhost:{port}`
/// 4. `http://localhost:11434`
///
/// OpenAI defaults to the public API; Azure has no default.
fn resolve_endpoint(
    provider: LlmProvider,
    explicit: Option<String>,
    get: &dyn Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, AiLlmError> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    match provider {
        LlmProvider::Ollama => {
            if let Some(url) = get("OLLAMA_URL") {
                return Ok(url);
            }
            if let Some(port) = get("OLLAMA_PORT") {
                port.trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidNumber {
                        var: "OLLAMA_PORT",
                        reason: "expected u16 (1..=65535)",
                    })?;
                return Ok(format!("http://localhost:{}", port.trim()));
            }
            Ok(DEFAULT_OLLAMA_URL.to_string())
        }
        LlmProvider::OpenAI => Ok(DEFAULT_OPENAI_URL.to_string()),
        LlmProvider::AzureOpenAI => Err(ConfigError::MissingVar(var).into()),
    }
}

fn resolve_api_key(
    provider: LlmProvider,
    key: Option<String>,
    var: &'static str,
) -> Result<Option<String>, AiLlmError> {
    match key {
        Some(k) => Ok(Some(k)),
        None if provider.requires_api_key() => Err(ConfigError::MissingVar(var).into()),
        None => Ok(None),
    }
}

fn resolve_api_version(provider: LlmProvider, explicit: Option<String>) -> Option<String> {
    match provider {
        LlmProvider::AzureOpenAI => {
            Some(explicit.unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()))
        }
        _ => None,
    }
}

fn parse_u32(
    get: &dyn Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u32>, AiLlmError> {
    get(var)
        .map(|v| {
            v.trim().parse::<u32>().map_err(|_| {
                AiLlmError::from(ConfigError::InvalidNumber {
                    var,
                    reason: "expected u32",
                })
            })
        })
        .transpose()
}

fn parse_u64(
    get: &dyn Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, AiLlmError> {
    get(var)
        .map(|v| {
            v.trim().parse::<u64>().map_err(|_| {
                AiLlmError::from(ConfigError::InvalidNumber {
                    var,
                    reason: "expected u64",
                })
            })
        })
        .transpose()
}
