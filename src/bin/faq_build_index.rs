//! Offline builder: reads the JSONL corpus and writes the index/lookup pair.

use std::{error::Error, sync::Arc};

use ai_llm_service::{
    config::default_config::config_embedding_from_env,
    service_profiles::LlmServiceProfiles,
};
use faq_index::{BuildOptions, IndexConfig, LlmEmbedder, build_from_config, probe_dimension};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let dotenv = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = &dotenv {
        if !e.not_found() {
            return Err(e.to_string().into());
        }
    }

    if let Err(e) = run().await {
        error!(error = %e, "index build failed");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cfg = IndexConfig::from_env()?;
    // Building only embeds; no chat profile is required.
    let svc = Arc::new(LlmServiceProfiles::embedding_only(
        config_embedding_from_env()?,
        Some(10),
    )?);

    let embedder = LlmEmbedder::new(svc, None);
    let dim = probe_dimension(&embedder, None).await?;
    let embedder = embedder.with_dim(dim);
    info!(
        corpus = ?cfg.corpus_path,
        model = embedder.model(),
        dim,
        embedding_input = %cfg.embedding_input,
        "building FAQ index"
    );

    let opts = BuildOptions {
        show_progress: true,
        ..BuildOptions::from_config(&cfg, embedder.model())
    };
    let store = build_from_config(&cfg, &embedder, &opts).await?;

    info!(
        entries = store.len(),
        dim = store.dim(),
        index = ?cfg.index_path,
        lookup = ?cfg.lookup_path,
        "FAQ index written"
    );
    Ok(())
}
