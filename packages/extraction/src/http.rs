//! Rate-limited HTTP client with per-domain throttling and retry.
//!
//! One client instance is constructed at process start and shared by every
//! extractor, so all outbound traffic to a given domain is paced by the same
//! throttle. Uses the governor crate for precise rate limiting.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::{Config, HttpConfig, RateLimits};
use crate::error::{HttpError, HttpResult};

pub use reqwest::Method;

type DomainThrottle = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Transport seam under the rate limiter.
///
/// The production implementation is [`HttpTransport`]; tests inject a
/// scripted mock to assert on attempt counts and call ordering.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request and decode the JSON body.
    async fn send(&self, method: Method, url: &str, params: &[(&str, String)])
        -> HttpResult<Value>;

    /// Release any held resources. Default is a no-op.
    async fn close(&self) {}
}

/// Reqwest-backed transport with a lazily created connection pool.
///
/// The physical client is built at most once, on first use, under a lock;
/// `close()` drops it and a later request transparently rebuilds it.
pub struct HttpTransport {
    config: HttpConfig,
    client: Mutex<Option<reqwest::Client>>,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    async fn pooled_client(&self) -> reqwest::Client {
        let mut guard = self.client.lock().await;
        guard
            .get_or_insert_with(|| {
                debug!(
                    max_keepalive = self.config.max_keepalive_connections,
                    timeout_secs = self.config.timeout.as_secs_f64(),
                    "building pooled HTTP client"
                );
                reqwest::Client::builder()
                    .pool_max_idle_per_host(self.config.max_keepalive_connections)
                    .pool_idle_timeout(self.config.keepalive_expiry)
                    .timeout(self.config.timeout)
                    .build()
                    .expect("failed to build HTTP client")
            })
            .clone()
    }

    fn classify_send_error(error: reqwest::Error, url: &str) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout {
                url: url.to_string(),
            }
        } else {
            HttpError::Connect {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
    ) -> HttpResult<Value> {
        let client = self.pooled_client().await;

        let response = client
            .request(method, url)
            .query(params)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                retry_after,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout {
                    url: url.to_string(),
                }
            } else {
                HttpError::Decode {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }

    async fn close(&self) {
        // Dropping the reqwest client releases its pooled connections.
        self.client.lock().await.take();
    }
}

/// HTTP client enforcing a maximum request rate per target domain, with
/// automatic retry on transient network failure.
///
/// Throttles are created lazily, at most once per domain, and shared across
/// all concurrent callers. Steady-state dispatch takes no lock beyond the
/// throttle's own pacing.
pub struct RateLimitedClient {
    transport: Arc<dyn Transport>,
    throttles: Mutex<HashMap<String, Arc<DomainThrottle>>>,
    rate_limits: RateLimits,
    max_retries: u32,
    backoff_factor: f64,
}

impl RateLimitedClient {
    /// Create a client backed by a real connection pool.
    pub fn new(config: &Config) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new(config.http.clone())), config)
    }

    /// Create a client over a custom transport (tests, instrumentation).
    pub fn with_transport(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            throttles: Mutex::new(HashMap::new()),
            rate_limits: config.rate_limits.clone(),
            max_retries: config.http.max_retries,
            backoff_factor: config.http.backoff_factor,
        }
    }

    /// Issue a request, suspending until the per-domain throttle permits
    /// dispatch.
    ///
    /// Connect and timeout errors are retried up to `max_retries` total
    /// attempts with exponential backoff; HTTP status errors are surfaced to
    /// the caller untouched. After exhausting retries the last transient
    /// error propagates unchanged in kind.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
    ) -> HttpResult<Value> {
        let domain = domain_of(url);
        let throttle = self.throttle_for(&domain).await;

        let mut attempt = 1u32;
        loop {
            throttle.until_ready().await;

            match self.transport.send(method.clone(), url, params).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let wait = backoff_delay(self.backoff_factor, attempt);
                    warn!(
                        url,
                        attempt,
                        wait_secs = wait.as_secs_f64(),
                        error = %e,
                        "transient HTTP failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> HttpResult<Value> {
        self.request(Method::GET, url, params).await
    }

    /// Release pooled connections and clear throttle state.
    ///
    /// Safe to call multiple times; a later request lazily rebuilds both.
    pub async fn close(&self) {
        self.transport.close().await;
        self.throttles.lock().await.clear();
    }

    /// Get or create the throttle for a domain, at most once per domain.
    async fn throttle_for(&self, domain: &str) -> Arc<DomainThrottle> {
        let mut throttles = self.throttles.lock().await;
        if let Some(throttle) = throttles.get(domain) {
            return throttle.clone();
        }

        let rate = self.rate_limits.rate_for(domain);
        let period = Duration::from_secs_f64(1.0 / rate);
        // Config validation guarantees a positive rate.
        let quota = Quota::with_period(period).expect("rate must be positive");
        let throttle = Arc::new(RateLimiter::direct(quota));
        debug!(domain, rate, "created domain throttle");
        throttles.insert(domain.to_string(), throttle.clone());
        throttle
    }
}

/// Domain key for rate limiting, derived from the URL host.
fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .unwrap_or_else(|| "default".to_string())
}

/// Exponential backoff: `base * 2^(attempt-1)`, clamped to [1s, 10s].
fn backoff_delay(base: f64, attempt: u32) -> Duration {
    let raw = base * 2f64.powi(attempt.saturating_sub(1) as i32);
    Duration::from_secs_f64(raw.clamp(1.0, 10.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::testing::MockTransport;
    use serde_json::json;
    use std::time::Instant;

    fn fast_config() -> Config {
        let mut config = Config::default();
        // Keep throttle waits negligible so only backoff timing matters.
        config.rate_limits.set_rate("api.flickr.com", 100.0);
        config.rate_limits.default = 100.0;
        config
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(
            domain_of("https://API.Flickr.com/services/rest/"),
            "api.flickr.com"
        );
        assert_eq!(domain_of("not a url"), "default");
    }

    #[test]
    fn test_backoff_delay_doubles_and_clamps() {
        assert_eq!(backoff_delay(1.0, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(1.0, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(1.0, 3), Duration::from_secs(4));
        assert_eq!(backoff_delay(1.0, 5), Duration::from_secs(10));
        // Sub-second bases clamp up to the 1s floor
        assert_eq!(backoff_delay(0.1, 1), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let transport = Arc::new(
            MockTransport::new()
                .with_error(HttpError::Timeout {
                    url: "https://api.flickr.com/".into(),
                })
                .with_error(HttpError::Connect {
                    url: "https://api.flickr.com/".into(),
                    reason: "refused".into(),
                })
                .with_response(json!({"stat": "ok"})),
        );
        let client = RateLimitedClient::with_transport(transport.clone(), &fast_config());

        let body = client
            .get("https://api.flickr.com/services/rest/", &[])
            .await
            .unwrap();

        assert_eq!(body["stat"], "ok");
        // k=2 transient failures then success: exactly k+1 attempts
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_propagate_last_error() {
        let transport = Arc::new(
            MockTransport::new()
                .with_error(HttpError::Timeout {
                    url: "https://api.flickr.com/".into(),
                })
                .with_error(HttpError::Timeout {
                    url: "https://api.flickr.com/".into(),
                })
                .with_error(HttpError::Timeout {
                    url: "https://api.flickr.com/".into(),
                })
                .with_response(json!({"stat": "ok"})),
        );
        let client = RateLimitedClient::with_transport(transport.clone(), &fast_config());

        let err = client
            .get("https://api.flickr.com/services/rest/", &[])
            .await
            .unwrap_err();

        // Original transient kind, after exactly max_retries attempts
        assert!(matches!(err, HttpError::Timeout { .. }));
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_status_errors_are_not_retried() {
        let transport = Arc::new(MockTransport::new().with_error(HttpError::Status {
            url: "https://api.flickr.com/".into(),
            status: 500,
            retry_after: None,
        }));
        let client = RateLimitedClient::with_transport(transport.clone(), &fast_config());

        let err = client
            .get("https://api.flickr.com/services/rest/", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Status { status: 500, .. }));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limiting_paces_requests() {
        let transport = Arc::new(
            MockTransport::new()
                .with_response(json!({}))
                .with_response(json!({}))
                .with_response(json!({})),
        );
        let mut config = Config::default();
        config.rate_limits.set_rate("paced.example", 2.0);
        let client = RateLimitedClient::with_transport(transport, &config);

        let start = Instant::now();
        for _ in 0..3 {
            client.get("https://paced.example/api", &[]).await.unwrap();
        }
        let elapsed = start.elapsed();

        // 3 requests at 2/sec: first immediate, the rest paced, so >= 1s;
        // allow scheduler slack
        assert!(
            elapsed.as_millis() >= 900,
            "rate limiting not enforced: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_one_throttle_per_domain() {
        let transport = Arc::new(
            MockTransport::new()
                .with_response(json!({}))
                .with_response(json!({})),
        );
        let client = RateLimitedClient::with_transport(transport, &fast_config());

        client.get("https://a.example/x", &[]).await.unwrap();
        client.get("https://a.example/y", &[]).await.unwrap();

        assert_eq!(client.throttles.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let transport = Arc::new(MockTransport::new().with_response(json!({})));
        let client = RateLimitedClient::with_transport(transport, &fast_config());

        client.get("https://a.example/x", &[]).await.unwrap();
        client.close().await;
        client.close().await;

        assert!(client.throttles.lock().await.is_empty());
    }
}
