//! Configuration loaded once from the environment and validated eagerly.
//!
//! Invalid values fail at startup rather than on first use. The config is
//! read-only after construction; tests build their own instances instead of
//! mutating a global.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::error::{ExtractError, Result};
use crate::secrets::SecretString;
use crate::validation::validate_api_key;

/// HTTP client pool and retry settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Upper bound on pooled connections.
    pub max_connections: usize,
    /// Keep-alive connections retained per host.
    pub max_keepalive_connections: usize,
    /// How long idle keep-alive connections stay pooled.
    pub keepalive_expiry: Duration,
    /// Per-request transport timeout.
    pub timeout: Duration,
    /// Total attempts for transient failures (connect, timeout).
    pub max_retries: u32,
    /// Base for exponential backoff between retries, in seconds.
    pub backoff_factor: f64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_connections: 100,
            max_keepalive_connections: 20,
            keepalive_expiry: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_factor: 1.0,
        }
    }
}

/// Per-domain outbound request rates, in requests per second.
#[derive(Debug, Clone)]
pub struct RateLimits {
    per_domain: HashMap<String, f64>,
    pub(crate) default: f64,
}

impl Default for RateLimits {
    fn default() -> Self {
        // Upstream APIs enforce hard per-key limits; exceeding them means
        // HTTP 429 and dropped data.
        let per_domain = HashMap::from([
            ("api.flickr.com".to_string(), 0.5),
            ("api.imgur.com".to_string(), 1.0),
            ("graph.instagram.com".to_string(), 0.5),
        ]);
        Self {
            per_domain,
            default: 2.0,
        }
    }
}

impl RateLimits {
    /// Rate for a domain, falling back to the configured default.
    pub fn rate_for(&self, domain: &str) -> f64 {
        self.per_domain.get(domain).copied().unwrap_or(self.default)
    }

    /// Override the rate for one domain.
    pub fn set_rate(&mut self, domain: impl Into<String>, requests_per_second: f64) {
        self.per_domain.insert(domain.into(), requests_per_second);
    }

    /// All configured domains and rates, plus the default.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.per_domain.iter().map(|(d, r)| (d.as_str(), *r))
    }

    pub fn default_rate(&self) -> f64 {
        self.default
    }
}

/// Extractor-level settings.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Members fetched concurrently per batch when resolving a collection.
    pub batch_size: usize,
    /// Overall deadline for one extraction request.
    pub request_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Process-wide configuration.
#[derive(Debug, Default, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub rate_limits: RateLimits,
    pub extractors: ExtractorConfig,
    /// Platform API keys, keyed by platform name.
    api_keys: HashMap<&'static str, SecretString>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` if present (development). Malformed numeric values are
    /// reported immediately rather than silently defaulted.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(key) = env::var("FLICKR_API_KEY") {
            if !key.trim().is_empty() {
                config.api_keys.insert("flickr", SecretString::new(key));
            }
        }

        if let Some(n) = parse_env::<usize>("HTTP_MAX_CONNECTIONS")? {
            config.http.max_connections = n;
        }
        if let Some(n) = parse_env::<usize>("HTTP_MAX_KEEPALIVE_CONNECTIONS")? {
            config.http.max_keepalive_connections = n;
        }
        if let Some(secs) = parse_env::<f64>("HTTP_KEEPALIVE_EXPIRY")? {
            config.http.keepalive_expiry = Duration::from_secs_f64(secs);
        }
        if let Some(secs) = parse_env::<f64>("HTTP_TIMEOUT")? {
            config.http.timeout = Duration::from_secs_f64(secs);
        }
        if let Some(n) = parse_env::<u32>("HTTP_MAX_RETRIES")? {
            config.http.max_retries = n;
        }
        if let Some(f) = parse_env::<f64>("HTTP_BACKOFF_FACTOR")? {
            config.http.backoff_factor = f;
        }

        if let Some(rate) = parse_env::<f64>("RATE_LIMIT_FLICKR")? {
            config.rate_limits.set_rate("api.flickr.com", rate);
        }
        if let Some(rate) = parse_env::<f64>("RATE_LIMIT_DEFAULT")? {
            config.rate_limits.default = rate;
        }

        if let Some(n) = parse_env::<usize>("EXTRACTOR_BATCH_SIZE")? {
            config.extractors.batch_size = n;
        }
        if let Some(secs) = parse_env::<f64>("EXTRACTOR_REQUEST_TIMEOUT")? {
            config.extractors.request_timeout = Duration::from_secs_f64(secs);
        }

        Ok(config)
    }

    /// Validate all values, collecting every problem into one error.
    ///
    /// Called at process startup so misconfiguration fails fast instead of
    /// surfacing on the first extraction.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.http.max_connections == 0 {
            problems.push("http.max_connections must be positive".to_string());
        }
        if self.http.max_keepalive_connections > self.http.max_connections {
            problems.push(
                "http.max_keepalive_connections cannot exceed http.max_connections".to_string(),
            );
        }
        if self.http.timeout.is_zero() {
            problems.push("http.timeout must be positive".to_string());
        }
        if self.http.max_retries == 0 {
            problems.push("http.max_retries must be at least 1".to_string());
        }
        if self.http.backoff_factor <= 0.0 {
            problems.push("http.backoff_factor must be positive".to_string());
        }

        for (domain, rate) in self.rate_limits.iter() {
            if rate <= 0.0 {
                problems.push(format!("rate limit for {domain} must be positive"));
            } else if rate > 100.0 {
                problems.push(format!("rate limit for {domain} is implausibly high (>100/s)"));
            }
        }
        if self.rate_limits.default <= 0.0 {
            problems.push("default rate limit must be positive".to_string());
        }

        if self.extractors.batch_size == 0 {
            problems.push("extractors.batch_size must be positive".to_string());
        } else if self.extractors.batch_size > 50 {
            problems.push("extractors.batch_size is implausibly high (>50)".to_string());
        }
        if self.extractors.request_timeout.is_zero() {
            problems.push("extractors.request_timeout must be positive".to_string());
        }

        for (platform, key) in &self.api_keys {
            if let Err(e) = validate_api_key(key.expose(), platform) {
                problems.push(e.to_string());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ExtractError::Config(problems.join("; ")))
        }
    }

    /// API key for a platform, if configured.
    pub fn api_key(&self, platform: &str) -> Option<&SecretString> {
        self.api_keys.get(platform)
    }

    /// Set a platform API key (used by tests and embedders).
    pub fn set_api_key(&mut self, platform: &'static str, key: impl Into<SecretString>) {
        self.api_keys.insert(platform, key.into());
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ExtractError::Config(format!("{name} has invalid value '{raw}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.extractors.batch_size, 5);
    }

    #[test]
    fn test_rate_for_unknown_domain_uses_default() {
        let limits = RateLimits::default();
        assert_eq!(limits.rate_for("api.flickr.com"), 0.5);
        assert_eq!(limits.rate_for("somewhere.example"), 2.0);
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = Config::default();
        config.extractors.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_validate_rejects_placeholder_key() {
        let mut config = Config::default();
        config.set_api_key("flickr", "your_flickr_api_key");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_collects_multiple_problems() {
        let mut config = Config::default();
        config.http.max_retries = 0;
        config.extractors.batch_size = 0;
        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("max_retries"));
        assert!(message.contains("batch_size"));
    }

    #[test]
    fn test_api_key_lookup() {
        let mut config = Config::default();
        assert!(config.api_key("flickr").is_none());
        config.set_api_key("flickr", "abcdef0123456789");
        assert_eq!(config.api_key("flickr").unwrap().expose(), "abcdef0123456789");
    }
}
