//! Shared LLM service with two active profiles: `chat` and `embedding`.
//!
//! The chat profile is optional: offline tools that only embed construct the
//! service with [`LlmServiceProfiles::embedding_only`].
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - Client caches are guarded by a `RwLock` that is released before any
//!   network call is awaited.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::chat_message::ChatMessage;
//! use ai_llm_service::config::default_config::{config_chat_from_env, config_embedding_from_env};
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_chat_from_env()?,
//!     config_embedding_from_env()?,
//!     Some(10),
//! )?);
//!
//! let txt = svc.chat(&[ChatMessage::user("Hello")], Some(0.5)).await?;
//! let emb = svc.embed("Ferris").await?;
//! println!("{txt} / dim = {}", emb.len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    chat_message::ChatMessage,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError},
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Shared service that manages the **chat** and **embedding** profiles.
pub struct LlmServiceProfiles {
    chat: Option<LlmModelConfig>,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,

    health: HealthService,
}

impl std::fmt::Debug for LlmServiceProfiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmServiceProfiles")
            .field("chat_model", &self.chat.as_ref().map(|c| &c.model))
            .field("embedding_model", &self.embedding.model)
            .finish()
    }
}

impl LlmServiceProfiles {
    /// Creates a new service with both profiles.
    ///
    /// Both configs are validated eagerly so that bad credentials fail at
    /// startup rather than on the first request.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] for invalid profiles or
    /// [`AiLlmError::HttpTransport`] if the health client cannot be built.
    pub fn new(
        chat: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        chat.validate()?;
        Self::build(Some(chat), embedding, health_timeout_secs)
    }

    /// Creates a service with the **embedding** profile only.
    ///
    /// [`LlmServiceProfiles::chat`] then fails with
    /// [`ConfigError::MissingVar`] for `CHAT_MODEL`.
    ///
    /// # Errors
    /// Same as [`LlmServiceProfiles::new`], for the embedding profile alone.
    pub fn embedding_only(
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        Self::build(None, embedding, health_timeout_secs)
    }

    fn build(
        chat: Option<LlmModelConfig>,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        embedding.validate()?;

        Ok(Self {
            chat,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Runs a chat completion with the **chat** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the provider call fails, or
    /// [`ConfigError::MissingVar`] when no chat profile is configured.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, AiLlmError> {
        let chat = self
            .chat
            .as_ref()
            .ok_or(ConfigError::MissingVar("CHAT_MODEL"))?;
        match chat.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(chat).await?;
                cli.chat(messages, temperature).await
            }
            LlmProvider::OpenAI | LlmProvider::AzureOpenAI => {
                let cli = self.get_or_init_openai(chat).await?;
                cli.chat(messages, temperature).await
            }
        }
    }

    /// Computes embeddings using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match self.embedding.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(&self.embedding).await?;
                cli.embeddings(input).await
            }
            LlmProvider::OpenAI | LlmProvider::AzureOpenAI => {
                let cli = self.get_or_init_openai(&self.embedding).await?;
                cli.embeddings(input).await
            }
        }
    }

    /// Returns a health snapshot for all distinct profiles.
    ///
    /// If the embedding profile equals the chat profile, it is checked only once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = Vec::<LlmModelConfig>::with_capacity(2);
        if let Some(chat) = &self.chat {
            list.push(chat.clone());
        }
        if self.chat.as_ref() != Some(&self.embedding) {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// The chat profile, if one is configured.
    pub fn chat_profile(&self) -> Option<&LlmModelConfig> {
        self.chat.as_ref()
    }

    pub fn embedding_profile(&self) -> &LlmModelConfig {
        &self.embedding
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    api_version: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            api_version: cfg.api_version.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}
