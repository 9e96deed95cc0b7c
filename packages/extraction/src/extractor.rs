//! The platform extractor capability.

use async_trait::async_trait;
use regex::Regex;

use crate::error::Result;
use crate::types::{ExtractOptions, ExtractionResult};

/// A platform-specific strategy that turns a URL into normalized image
/// metadata.
///
/// No inheritance hierarchy: anything implementing this capability set can be
/// registered. Implementations compile their patterns once at construction
/// and are immutable afterward.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Platform name, unique within a registry.
    fn platform_name(&self) -> &'static str;

    /// URL patterns this extractor recognizes, compiled case-insensitive.
    fn url_patterns(&self) -> &[Regex];

    /// Whether any pattern search-matches (substring, not full-match) the URL.
    fn matches(&self, url: &str) -> bool {
        self.url_patterns().iter().any(|p| p.is_match(url))
    }

    /// Extract normalized image records from a platform URL.
    async fn extract(&self, url: &str, options: &ExtractOptions) -> Result<ExtractionResult>;
}

/// Compile case-insensitive patterns, panicking on an invalid literal.
///
/// Only called with compile-time pattern constants, so a failure is a
/// programming error caught by the constructor tests.
pub(crate) fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| {
            regex::RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("invalid URL pattern literal")
        })
        .collect()
}
