//! Domain types shared by extractors, the service façade, and the HTTP
//! surface.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An inbound extraction request: the URL plus free-form options.
///
/// Options are validated against a whitelist before use; unrecognized keys
/// are dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Whether a result came from one upstream object or a collection listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Single,
    Album,
}

/// One resolution/quality rendition of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_label: Option<String>,
}

/// The uniform document every extractor produces.
///
/// `images` is non-empty on success; `metadata` carries platform-specific
/// context (photo id, owner, album title, counts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub platform: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub images: Vec<ImageRecord>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Preferred size variant, when a caller asks for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePreference {
    Thumbnail,
    Small,
    Medium,
    Large,
    Original,
}

impl SizePreference {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "thumbnail" => Some(Self::Thumbnail),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            "original" => Some(Self::Original),
            _ => None,
        }
    }
}

/// Response shaping preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Detailed,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// Options that survived whitelist validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub size: Option<SizePreference>,
    pub format: Option<OutputFormat>,
    pub timeout: Option<Duration>,
    pub max_images: Option<usize>,
}
