//! JSON body extractor whose rejections use the service's error body.

use axum::extract::{FromRequest, Request, rejection::JsonRejection};

use crate::error_handler::AppError;

/// Drop-in for `axum::Json` that reports malformed bodies as
/// `400 {"error": "BAD_REQUEST", "message": ...}`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
