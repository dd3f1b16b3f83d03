use std::str::FromStr;

use crate::error_handler::{AiLlmError, ConfigError, Provider};

/// Represents the provider (backend) used for LLM inference or embeddings.
///
/// - `Ollama` talks to a local/remote Ollama runtime (`/api/chat`, `/api/embeddings`).
/// - `OpenAI` talks to the public OpenAI REST API (`/v1/...`) with Bearer auth.
/// - `AzureOpenAI` talks to an Azure-style deployment gateway
///   (`/openai/deployments/{model}/...?api-version=...`) with an `api-key` header.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let p: LlmProvider = "azure".parse().unwrap();
/// assert_eq!(p, LlmProvider::AzureOpenAI);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI's public API.
    OpenAI,
    /// Azure OpenAI compatible gateway (deployment-addressed).
    AzureOpenAI,
}

impl LlmProvider {
    /// True for providers that refuse requests without an API key.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, LlmProvider::Ollama)
    }
}

impl From<LlmProvider> for Provider {
    fn from(p: LlmProvider) -> Self {
        match p {
            LlmProvider::Ollama => Provider::Ollama,
            LlmProvider::OpenAI => Provider::OpenAI,
            LlmProvider::AzureOpenAI => Provider::AzureOpenAI,
        }
    }
}

impl FromStr for LlmProvider {
    type Err = AiLlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            "azure" | "azure_openai" | "azure-openai" | "dial" => Ok(LlmProvider::AzureOpenAI),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}
