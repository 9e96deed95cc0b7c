//! Pure REST client for the image URL extraction service.
//!
//! A minimal client for driving a running extractor instance. Supports
//! submitting extraction requests, listing configured platforms, and
//! health checks.
//!
//! # Example
//!
//! ```rust,ignore
//! use extractor_client::ExtractorClient;
//!
//! let client = ExtractorClient::new("http://localhost:8000".into());
//!
//! let result = client.extract("https://www.flickr.com/photos/user/12345", None).await?;
//! for image in &result.images {
//!     println!("{}", image.url);
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{ClientError, Result};
pub use types::{ErrorBody, ExtractRequest, ExtractResponse, ImageInfo, PlatformsResponse};

use serde_json::{Map, Value};

pub struct ExtractorClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExtractorClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Extract image URLs from a source page URL.
    ///
    /// `options` passes through to the service unchanged; unknown keys are
    /// dropped server-side.
    pub async fn extract(
        &self,
        url: &str,
        options: Option<Map<String, Value>>,
    ) -> Result<ExtractResponse> {
        let request = ExtractRequest {
            url: url.to_string(),
            options: options.unwrap_or_default(),
        };

        tracing::debug!(url, "Submitting extraction request");
        let resp = self
            .client
            .post(format!("{}/extract", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), resp).await);
        }

        Ok(resp.json().await?)
    }

    /// List the platforms the service can extract from.
    pub async fn platforms(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(format!("{}/platforms", self.base_url))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), resp).await);
        }

        let body: PlatformsResponse = resp.json().await?;
        Ok(body.platforms)
    }

    /// Check whether the service is up.
    pub async fn health(&self) -> Result<bool> {
        let resp = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Build a [`ClientError::Api`] from a non-2xx response, preferring the
    /// service's structured error message over the raw body.
    async fn api_error(status: u16, resp: reqwest::Response) -> ClientError {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        ClientError::Api { status, message }
    }
}
