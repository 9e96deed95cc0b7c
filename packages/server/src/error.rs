//! Error surface: maps the extraction taxonomy onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use image_extraction::ExtractError;
use serde_json::json;

/// Wrapper giving `ExtractError` an HTTP shape.
///
/// Every response body carries the machine-readable kind, the human message,
/// and the structured detail map for debuggability.
pub struct ApiError(pub ExtractError);

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            // Misconfigured deployment: the service itself is unhealthy
            "configuration_error" | "platform_not_configured" => StatusCode::SERVICE_UNAVAILABLE,
            "unsupported_platform" => StatusCode::BAD_REQUEST,
            "validation_error" | "invalid_url" => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "extraction request failed");
        } else {
            tracing::warn!(kind = self.0.kind(), error = %self.0, "extraction request rejected");
        }

        let body = json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
                "details": self.0.details(),
            }
        });

        (status, Json(body)).into_response()
    }
}
