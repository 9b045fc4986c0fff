use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::types::ErrorResponse;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body was not a valid prediction request.
    #[error("{}", .0.body_text())]
    MalformedRequest(#[from] JsonRejection),
    #[error("Prediction failed: {0:#}")]
    Prediction(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MalformedRequest(rejection) => {
                tracing::debug!(error = %self, "Rejected malformed request");
                rejection.status()
            }
            ApiError::Prediction(_) => {
                tracing::error!(error = %self, "Prediction failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorResponse {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
