//! POST /get_faq_response: answers a question from the FAQ corpus.

use std::sync::Arc;

use axum::{Json, extract::State};
use faq_answer::QueryOutcome;
use tracing::debug;

use crate::{
    shared::app_state::AppState,
    error_handler::{AppError, AppResult, NOT_FOUND_MESSAGE},
    middleware_layer::json_extractor::ApiJson,
    routes::faq::faq_request::{FaqRequest, FaqResponse},
};

/// Handler: POST /get_faq_response
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/get_faq_response \
///   -H 'content-type: application/json' \
///   -d '{"query":"What is COVID-19?","history":[]}'
/// ```
pub async fn get_faq_response(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<FaqRequest>,
) -> AppResult<Json<FaqResponse>> {
    if body.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be blank".into()));
    }

    match state.ctx.answer(&body.query, &body.history).await? {
        QueryOutcome::Answered(r) => Ok(Json(FaqResponse {
            query: r.query,
            enhanced_response: r.enhanced_answer,
        })),
        QueryOutcome::NotFound { reason, .. } => {
            debug!(%reason, "responding 404");
            Err(AppError::NotFound(NOT_FOUND_MESSAGE))
        }
    }
}
