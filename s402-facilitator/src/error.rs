//! HTTP error mapping for route handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use s402::FacilitatorError;

/// Wrapper turning a [`FacilitatorError`] into an HTTP response.
///
/// Only transport-level failures reach this type — logical rejections are
/// carried inside the protocol response bodies with a 200 status.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub FacilitatorError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            FacilitatorError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": self.0.reason(),
            "detail": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
