//! GET /health: index size plus a probe of every LLM profile.

use std::sync::Arc;

use ai_llm_service::health_service::HealthStatus;
use axum::{Json, extract::State};
use serde::Serialize;

use crate::shared::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub index_entries: usize,
    pub dim: usize,
    pub providers: Vec<HealthStatus>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let providers = match &state.llm {
        Some(svc) => svc.health_all().await,
        None => Vec::new(),
    };
    let store = state.ctx.store();
    Json(HealthResponse {
        index_entries: store.len(),
        dim: store.dim(),
        providers,
    })
}
