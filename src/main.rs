use std::{error::Error, sync::Arc};

use ai_llm_service::{
    config::default_config::{config_chat_from_env, config_embedding_from_env},
    service_profiles::LlmServiceProfiles,
    telemetry,
};
use api::AppState;
use faq_answer::{EnhancerConfig, ServiceContext};
use faq_index::IndexConfig;
use tracing::{Level, error, info};
use tracing_subscriber::{Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; the environment may already be populated.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(fmt::layer().with_target(true).with_filter(not_llm_service()))
        .with(telemetry::layer())
        .init();

    if let Err(e) = &dotenv {
        if !e.not_found() {
            return Err(e.to_string().into());
        }
    }

    if let Err(e) = run().await {
        error!(error = %e, "FAQ assistant failed");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn Error>> {
    let svc = Arc::new(LlmServiceProfiles::new(
        config_chat_from_env()?,
        config_embedding_from_env()?,
        Some(10),
    )?);
    let embedding = svc.embedding_profile();
    info!(
        chat_provider = ?svc.chat_profile().map(|c| c.provider),
        chat_model = ?svc.chat_profile().map(|c| c.model.as_str()),
        embedding_provider = ?embedding.provider,
        embedding_model = %embedding.model,
        "LLM profiles configured"
    );

    let index_cfg = IndexConfig::from_env()?;
    let enhancer_cfg = EnhancerConfig::from_env()?;
    let ctx = ServiceContext::bootstrap(svc.clone(), &index_cfg, enhancer_cfg).await?;

    api::start(Arc::new(AppState::new(Arc::new(ctx), Some(svc)))).await?;
    Ok(())
}

/// The library layer renders `ai_llm_service` events; keep them out of the default layer.
fn not_llm_service<S>() -> impl tracing_subscriber::layer::Filter<S> {
    tracing_subscriber::filter::filter_fn(|meta| !meta.target().starts_with(telemetry::TARGET_PREFIX))
}
