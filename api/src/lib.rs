use std::sync::Arc;

mod shared;
mod error_handler;
mod middleware_layer;
mod routes;

pub use crate::shared::app_state::AppState;
pub use crate::error_handler::AppError;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::routes::{faq::faq_route::get_faq_response, health_route::health};

/// Listen address used when `API_ADDRESS` is unset.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8000";

/// Builds the HTTP router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/get_faq_response", post(get_faq_response))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API until Ctrl+C.
///
/// # Errors
/// [`AppError::Bind`] if the address cannot be bound, [`AppError::Server`]
/// if the server stops with an I/O error.
pub async fn start(state: Arc<AppState>) -> Result<(), AppError> {
    let host_url = std::env::var("API_ADDRESS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(|source| AppError::Bind {
            addr: host_url.clone(),
            source,
        })?;
    info!(address = %host_url, "FAQ API listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("FAQ API stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
