use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use image_extraction::{ExtractionRequest, ExtractionResult};

use crate::app::AppState;
use crate::error::ApiError;

/// `POST /extract` — run an extraction and return the normalized result.
pub async fn extract_handler(
    State(state): State<AppState>,
    Json(request): Json<ExtractionRequest>,
) -> Result<Json<ExtractionResult>, ApiError> {
    info!(url = %request.url, "extraction requested");
    let result = state.service.extract(&request.url, &request.options).await?;
    Ok(Json(result))
}

/// `GET /platforms` — supported platforms, in registration order.
pub async fn platforms_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "platforms": state.service.platforms() }))
}
