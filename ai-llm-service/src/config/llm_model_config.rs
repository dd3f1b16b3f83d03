use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, Result, validate_http_endpoint, validate_range_f32};

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `provider`: Which backend to use (Ollama, OpenAI, Azure OpenAI).
/// - `model`: The model identifier; for Azure this is the deployment name.
/// - `endpoint`: Base URL of the inference endpoint.
/// - `api_key`: Optional API key for providers that require authentication.
/// - `api_version`: Azure `api-version` query parameter.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "gpt-4o-mini".to_string(),
///     endpoint: "https://api.openai.com".to_string(),
///     api_key: Some("sk-...".to_string()),
///     api_version: None,
///     max_tokens: Some(512),
///     temperature: Some(0.5),
///     top_p: None,
///     timeout_secs: Some(30),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (Azure: deployment name).
    pub model: String,

    /// Inference endpoint (base URL).
    pub endpoint: String,

    /// Optional API key for authentication.
    pub api_key: Option<String>,

    /// Azure `api-version`, ignored by other providers.
    pub api_version: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Validates the fields that would otherwise only fail on the first request.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] for a blank model name
    /// - [`ConfigError::InvalidFormat`] for a non-http endpoint
    /// - [`ConfigError::MissingVar`] when the provider needs an API key and none is set
    /// - [`ConfigError::OutOfRange`] for temperature outside `0.0..=2.0` or top_p outside `0.0..=1.0`
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", &self.endpoint)?;
        if self.provider.requires_api_key()
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(ConfigError::MissingVar("api_key").into());
        }
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }

    /// Endpoint without trailing slashes.
    pub fn base_url(&self) -> String {
        self.endpoint.trim().trim_end_matches('/').to_string()
    }
}
