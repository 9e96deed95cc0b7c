//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Every error exposes a
//! machine-readable kind and a structured detail map so the HTTP layer
//! can surface actionable failure reports.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors that can occur during extraction operations.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Platform credential missing or unusable; raised before any network I/O.
    #[error("platform '{platform}' is not configured: missing {env_var}")]
    PlatformNotConfigured {
        platform: &'static str,
        env_var: &'static str,
    },

    /// Well-formed URL, but no registered extractor matches it.
    #[error("no extractor supports URL: {url}")]
    UnsupportedPlatform { url: String, supported: Vec<String> },

    /// Malformed or unparsable input URL.
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrlError),

    /// An option or field failed a whitelist or range check.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport-level failure (connect, timeout, status, decode).
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The upstream platform reported a non-success status in its envelope.
    #[error("{platform} API error: {message}")]
    Api {
        platform: &'static str,
        code: Option<i64>,
        message: String,
    },

    /// Upstream rate limit exceeded (HTTP 429).
    #[error("{platform} rate limit exceeded")]
    RateLimited {
        platform: String,
        retry_after: Option<u64>,
    },

    /// The per-request deadline elapsed before extraction finished.
    #[error("extraction deadline of {seconds}s exceeded for {url}")]
    DeadlineExceeded { url: String, seconds: u64 },

    /// Configuration failed eager validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Generic extraction-phase failure not otherwise classified.
    #[error("failed to extract from {platform} URL {url}: {reason}")]
    Extraction {
        url: String,
        platform: &'static str,
        reason: String,
    },
}

impl ExtractError {
    /// Machine-readable error kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlatformNotConfigured { .. } => "platform_not_configured",
            Self::UnsupportedPlatform { .. } => "unsupported_platform",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Validation(_) => "validation_error",
            Self::Http(HttpError::Timeout { .. }) => "timeout_error",
            Self::Http(_) => "network_error",
            Self::Api { .. } => "api_error",
            Self::RateLimited { .. } => "rate_limit_exceeded",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::Config(_) => "configuration_error",
            Self::Extraction { .. } => "extraction_error",
        }
    }

    /// Structured detail map for error responses and logs.
    pub fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        match self {
            Self::PlatformNotConfigured { platform, env_var } => {
                details.insert("platform".into(), json!(platform));
                details.insert("missing_config".into(), json!(env_var));
            }
            Self::UnsupportedPlatform { url, supported } => {
                details.insert("url".into(), json!(url));
                details.insert("supported_platforms".into(), json!(supported));
            }
            Self::InvalidUrl(e) => {
                details.insert("url".into(), json!(e.url));
                details.insert("reason".into(), json!(e.reason));
            }
            Self::Validation(e) => {
                details.insert("field".into(), json!(e.field));
                details.insert("value".into(), json!(e.value));
                details.insert("reason".into(), json!(e.reason));
            }
            Self::Http(e) => {
                details.insert("url".into(), json!(e.url()));
                if let HttpError::Status { status, .. } = e {
                    details.insert("status_code".into(), json!(status));
                }
            }
            Self::Api {
                platform,
                code,
                message,
            } => {
                details.insert("platform".into(), json!(platform));
                details.insert("code".into(), json!(code));
                details.insert("message".into(), json!(message));
            }
            Self::RateLimited {
                platform,
                retry_after,
            } => {
                details.insert("platform".into(), json!(platform));
                details.insert("status_code".into(), json!(429));
                if let Some(secs) = retry_after {
                    details.insert("retry_after".into(), json!(secs));
                }
            }
            Self::DeadlineExceeded { url, seconds } => {
                details.insert("url".into(), json!(url));
                details.insert("timeout_seconds".into(), json!(seconds));
            }
            Self::Config(reason) => {
                details.insert("reason".into(), json!(reason));
            }
            Self::Extraction {
                url,
                platform,
                reason,
            } => {
                details.insert("url".into(), json!(url));
                details.insert("platform".into(), json!(platform));
                details.insert("reason".into(), json!(reason));
            }
        }
        details
    }
}

/// A malformed or unparsable input URL.
#[derive(Debug, Error)]
#[error("invalid URL '{url}': {reason}")]
pub struct InvalidUrlError {
    pub url: String,
    pub reason: String,
}

impl InvalidUrlError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// A recognized option or field with an out-of-range or wrong-typed value.
#[derive(Debug, Error)]
#[error("validation failed for field '{field}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Transport-level errors from the rate-limited HTTP client.
///
/// Connect and timeout failures are transient and retried by the client;
/// status and decode errors propagate to the caller untouched.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// Connection could not be established.
    #[error("connection failed for {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The request timed out at the transport layer.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: u16,
        retry_after: Option<u64>,
    },

    /// The response body was not valid JSON.
    #[error("failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl HttpError {
    /// Whether the error class is retryable by the client.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Timeout { .. })
    }

    /// The URL the failed request targeted.
    pub fn url(&self) -> &str {
        match self {
            Self::Connect { url, .. }
            | Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Decode { url, .. } => url,
        }
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Result type alias for transport operations.
pub type HttpResult<T> = std::result::Result<T, HttpError>;
