//! Service façade: the single inbound operation.
//!
//! Sanitizes and validates input, routes through the registry, and bounds
//! each extraction with an overall deadline. Constructed once at process
//! start with an explicitly injected registry — no global state.

use serde_json::{Map, Value};
use tracing::info;

use crate::config::Config;
use crate::error::{ExtractError, Result};
use crate::registry::ExtractorRegistry;
use crate::types::ExtractionResult;
use crate::validation::{sanitize_url, validate_options};

pub struct ExtractionService {
    registry: ExtractorRegistry,
    config: Config,
}

impl ExtractionService {
    pub fn new(registry: ExtractorRegistry, config: Config) -> Self {
        Self { registry, config }
    }

    /// Extract normalized image records from a URL.
    ///
    /// Validation and dispatch failures surface before any network I/O. The
    /// deadline is the validated `timeout` option when present, otherwise
    /// the configured default; on expiry the extraction fails and in-flight
    /// upstream calls are abandoned (they are read-only, so nothing needs
    /// compensating).
    pub async fn extract(
        &self,
        url: &str,
        options: &Map<String, Value>,
    ) -> Result<ExtractionResult> {
        let url = sanitize_url(url)?;
        let options = validate_options(options)?;

        let extractor =
            self.registry
                .get_extractor(&url)
                .ok_or_else(|| ExtractError::UnsupportedPlatform {
                    url: url.clone(),
                    supported: self.registry.platforms(),
                })?;

        let deadline = options
            .timeout
            .unwrap_or(self.config.extractors.request_timeout);

        let result =
            match tokio::time::timeout(deadline, extractor.extract(&url, &options)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(ExtractError::DeadlineExceeded {
                        url,
                        seconds: deadline.as_secs(),
                    })
                }
            };

        info!(
            url,
            platform = %result.platform,
            images = result.images.len(),
            "extraction completed"
        );
        Ok(result)
    }

    /// Supported platform names, in registration order.
    pub fn platforms(&self) -> Vec<String> {
        self.registry.platforms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as ExtractResult;
    use crate::extractor::{compile_patterns, Extractor};
    use crate::types::{ExtractOptions, ImageRecord, ResultKind};
    use async_trait::async_trait;
    use regex::Regex;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    struct SlowExtractor {
        patterns: Vec<Regex>,
        delay: Duration,
    }

    #[async_trait]
    impl Extractor for SlowExtractor {
        fn platform_name(&self) -> &'static str {
            "slowpics"
        }

        fn url_patterns(&self) -> &[Regex] {
            &self.patterns
        }

        async fn extract(
            &self,
            _url: &str,
            _options: &ExtractOptions,
        ) -> ExtractResult<crate::types::ExtractionResult> {
            tokio::time::sleep(self.delay).await;
            Ok(crate::types::ExtractionResult {
                platform: "slowpics".into(),
                kind: ResultKind::Single,
                images: vec![ImageRecord {
                    url: "https://img.example/slow.jpg".into(),
                    title: None,
                    description: None,
                    width: None,
                    height: None,
                    size_label: None,
                }],
                metadata: Default::default(),
            })
        }
    }

    fn slow_service(delay: Duration) -> ExtractionService {
        let extractor = Arc::new(SlowExtractor {
            patterns: compile_patterns(&[r"slowpics\.example"]),
            delay,
        });
        ExtractionService::new(ExtractorRegistry::new(vec![extractor]), Config::default())
    }

    #[tokio::test]
    async fn test_unsupported_platform_carries_url_and_supported_list() {
        let service = slow_service(Duration::ZERO);

        let err = service
            .extract("https://unsupported.example/x", &Map::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "unsupported_platform");
        let details = err.details();
        assert_eq!(details["url"], "https://unsupported.example/x");
        assert_eq!(details["supported_platforms"][0], "slowpics");
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_dispatch() {
        let service = slow_service(Duration::ZERO);
        let err = service
            .extract("not-a-url", &Map::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_url");
    }

    #[tokio::test]
    async fn test_bad_option_rejected_before_dispatch() {
        let service = slow_service(Duration::ZERO);
        let mut options = Map::new();
        options.insert("max_images".into(), json!(-3));
        let err = service
            .extract("https://slowpics.example/1", &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_extraction() {
        let service = slow_service(Duration::from_secs(120));

        let mut options = Map::new();
        options.insert("timeout".into(), json!(1));
        let err = service
            .extract("https://slowpics.example/1", &options)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "deadline_exceeded");
    }

    #[tokio::test]
    async fn test_sanitized_url_reaches_extractor() {
        let service = slow_service(Duration::ZERO);
        let result = service
            .extract("  https://slowpics.example/1 ", &Map::new())
            .await
            .unwrap();
        assert_eq!(result.platform, "slowpics");
        assert_eq!(result.images.len(), 1);
    }
}
