//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use ai_llm_service::error_handler::env_opt;

use crate::error::AnswerError;
use crate::prompt::DEFAULT_SYSTEM;

/// Enhancer knobs. All fields have defaults via [`EnhancerConfig::default`].
#[derive(Clone, Debug, PartialEq)]
pub struct EnhancerConfig {
    pub system_prompt: String,
    /// Sampling temperature, `0.0..=2.0`.
    pub temperature: f32,
    /// Render only the most recent N turns (`None` = all).
    pub history_limit: Option<usize>,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Total attempts before falling back (>= 1).
    pub attempts: u32,
    /// Backoff unit; attempt `n` waits `n * retry_backoff` before retrying.
    pub retry_backoff: Duration,
    /// Drop repeated sentences from the completion.
    pub dedup_sentences: bool,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM.to_string(),
            temperature: 0.5,
            history_limit: None,
            timeout: Duration::from_secs(30),
            attempts: 1,
            retry_backoff: Duration::from_millis(500),
            dedup_sentences: true,
        }
    }
}

impl EnhancerConfig {
    /// Build from environment variables with sensible defaults.
    ///
    /// # Errors
    /// [`AnswerError::Config`] for values that do not parse or are out of range.
    pub fn from_env() -> Result<Self, AnswerError> {
        Self::from_lookup(&env_opt)
    }

    pub fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, AnswerError> {
        let d = Self::default();
        let cfg = Self {
            system_prompt: get("FAQ_SYSTEM_PROMPT").unwrap_or(d.system_prompt),
            temperature: parse(get, "FAQ_TEMPERATURE")?.unwrap_or(d.temperature),
            history_limit: parse(get, "FAQ_HISTORY_LIMIT")?,
            timeout: parse(get, "FAQ_ENHANCE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.timeout),
            attempts: parse(get, "FAQ_ENHANCE_ATTEMPTS")?.unwrap_or(d.attempts),
            retry_backoff: d.retry_backoff,
            dedup_sentences: match get("FAQ_DEDUP_SENTENCES") {
                Some(v) => parse_bool("FAQ_DEDUP_SENTENCES", &v)?,
                None => d.dedup_sentences,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AnswerError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AnswerError::Config(
                "FAQ_TEMPERATURE must be within 0.0..=2.0".into(),
            ));
        }
        if self.attempts == 0 {
            return Err(AnswerError::Config("FAQ_ENHANCE_ATTEMPTS must be >= 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(AnswerError::Config(
                "FAQ_ENHANCE_TIMEOUT_SECS must be > 0".into(),
            ));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(AnswerError::Config("FAQ_SYSTEM_PROMPT is blank".into()));
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, AnswerError> {
    get(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| AnswerError::Config(format!("{key}: cannot parse `{v}`")))
        })
        .transpose()
}

fn parse_bool(key: &str, v: &str) -> Result<bool, AnswerError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AnswerError::Config(format!("{key}: expected boolean, got `{v}`"))),
    }
}
