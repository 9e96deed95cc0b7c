//! Ordered extractor registry with first-match dispatch.

use std::sync::Arc;

use crate::config::Config;
use crate::extractor::Extractor;
use crate::http::RateLimitedClient;
use crate::platforms::FlickrExtractor;

/// Owns the set of registered platform extractors and routes URLs to them.
///
/// The extractor set is fixed at construction. Dispatch policy is
/// first-registered-wins: when extractors have overlapping URL patterns, the
/// one registered earlier takes the URL. This ordering is deliberate,
/// documented behavior, not an accident of iteration.
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Build a registry from an explicit extractor list (testing, embedding).
    pub fn new(extractors: Vec<Arc<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// Build the default registry with all shipped platform extractors,
    /// sharing one rate-limited client.
    pub fn with_defaults(client: Arc<RateLimitedClient>, config: &Config) -> Self {
        Self::new(vec![Arc::new(FlickrExtractor::new(client, config))])
    }

    /// Find the extractor for a URL: first registered whose pattern set
    /// matches wins.
    pub fn get_extractor(&self, url: &str) -> Option<Arc<dyn Extractor>> {
        self.extractors.iter().find(|e| e.matches(url)).cloned()
    }

    /// Supported platform names, in registration order.
    pub fn platforms(&self) -> Vec<String> {
        self.extractors
            .iter()
            .map(|e| e.platform_name().to_string())
            .collect()
    }
}
