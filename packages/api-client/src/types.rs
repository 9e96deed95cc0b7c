use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request body for `POST /extract`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractRequest {
    pub url: String,
    pub options: Map<String, Value>,
}

/// One extracted image rendition.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageInfo {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub size_label: Option<String>,
}

/// Response body for `POST /extract`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractResponse {
    pub platform: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub images: Vec<ImageInfo>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Response body for `GET /platforms`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsResponse {
    pub platforms: Vec<String>,
}

/// Error envelope the service attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub details: Map<String, Value>,
}
