//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested enums (e.g., [`ConfigError`],
//! [`HealthError`], [`ProviderError`]). Small helpers for reading and
//! validating configuration values return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/// Maximum number of characters kept from an upstream error body.
const SNIPPET_MAX_CHARS: usize = 240;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
///
/// Variants wrap domain-specific enums (config/health/provider) and a few common
/// cases (e.g., HTTP transport, timeouts).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Health-check/connectivity/decoding errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Provider call failed (bad status, undecodable body, empty choices).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND` / `EMBEDDING_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `CHAT_ENDPOINT`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range.
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for provider health checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    /// Upstream returned a non-successful HTTP status.
    #[error("[AI LLM Service] health probe failed: {0}")]
    HttpStatus(HttpError),

    /// Response payload could not be decoded as expected.
    #[error("[AI LLM Service] decode error: {0}")]
    Decode(String),
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Provider tag used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
    AzureOpenAI,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::Ollama => "Ollama",
            Provider::OpenAI => "OpenAI",
            Provider::AzureOpenAI => "Azure OpenAI",
        };
        f.write_str(s)
    }
}

/// Non-success HTTP response details.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// Numeric HTTP status code.
    pub status: StatusCode,
    /// Request URL.
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// What went wrong while talking to a provider.
#[derive(Debug)]
pub enum ProviderErrorKind {
    /// Config names a different provider than the client expects.
    InvalidProvider,
    /// Provider requires an API key and none was configured.
    MissingApiKey,
    /// Azure deployments require an `api-version` query parameter.
    MissingApiVersion,
    /// Endpoint is empty or not http/https.
    InvalidEndpoint(String),
    /// Upstream answered with a non-2xx status.
    HttpStatus(HttpError),
    /// Body could not be parsed into the expected shape.
    Decode(String),
    /// Completion response carried no usable message.
    EmptyChoices,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::InvalidProvider => f.write_str("invalid provider for this client"),
            ProviderErrorKind::MissingApiKey => f.write_str("missing API key"),
            ProviderErrorKind::MissingApiVersion => f.write_str("missing api-version"),
            ProviderErrorKind::InvalidEndpoint(e) => write!(f, "invalid endpoint: {e}"),
            ProviderErrorKind::HttpStatus(h) => write!(f, "{h}"),
            ProviderErrorKind::Decode(m) => write!(f, "decode error: {m}"),
            ProviderErrorKind::EmptyChoices => f.write_str("response contained no choices"),
        }
    }
}

/// Provider-scoped failure.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Trims an upstream body to a short single-line snippet for logs and errors.
pub fn make_snippet(text: &str) -> String {
    text.chars()
        .take(SNIPPET_MAX_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/* ------------------------------------------------------------------------- */
/* Env helpers                                                               */
/* ------------------------------------------------------------------------- */

/// Returns the variable if set and non-empty, otherwise `None`.
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with a
/// valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if is_http_url(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// True when the trimmed value is non-empty and uses an http(s) scheme.
pub fn is_http_url(value: &str) -> bool {
    let v = value.trim();
    v.starts_with("http://") || v.starts_with("https://")
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_single_line_and_bounded() {
        let body = format!("line one\nline two\r\n{}", "x".repeat(1000));
        let s = make_snippet(&body);
        assert!(!s.contains('\n'));
        assert!(s.chars().count() <= SNIPPET_MAX_CHARS);
        assert!(s.starts_with("line one line two"));
    }

    #[test]
    fn range_validation() {
        assert!(validate_range_f32("temperature", 0.5, 0.0, 2.0).is_ok());
        assert!(validate_range_f32("temperature", 2.5, 0.0, 2.0).is_err());
        assert!(validate_range_f32("temperature", f32::NAN, 0.0, 2.0).is_err());
    }

    #[test]
    fn endpoint_validation() {
        assert!(validate_http_endpoint("X", "https://example.org").is_ok());
        assert!(validate_http_endpoint("X", "ftp://example.org").is_err());
        assert!(validate_http_endpoint("X", "").is_err());
    }

    #[test]
    fn provider_error_message_names_provider() {
        let e = ProviderError::new(Provider::AzureOpenAI, ProviderErrorKind::EmptyChoices);
        assert_eq!(
            e.to_string(),
            "[AI LLM Service] Azure OpenAI: response contained no choices"
        );
    }
}
