//! Application setup and router construction.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use image_extraction::ExtractionService;

use crate::routes::{extract_handler, health_handler, platforms_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExtractionService>,
}

/// Build the Axum application router.
///
/// The request timeout layer sits above the extraction service's own
/// per-request deadline, so a stuck handler cannot hold a connection open
/// indefinitely.
pub fn build_app(service: Arc<ExtractionService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/extract", post(extract_handler))
        .route("/platforms", get(platforms_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(310)))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use image_extraction::testing::MockTransport;
    use image_extraction::{Config, ExtractorRegistry, FlickrExtractor, RateLimitedClient};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app(configured_key: bool) -> Router {
        let mut config = Config::default();
        if configured_key {
            config.set_api_key("flickr", "a1b2c3d4e5f6a7b8");
        }
        config.rate_limits.set_rate("api.flickr.com", 100.0);

        let transport = Arc::new(
            MockTransport::new()
                .with_route(
                    &[("method", "flickr.photos.getInfo")],
                    Ok(json!({
                        "stat": "ok",
                        "photo": {
                            "title": {"_content": "Sunset"},
                            "owner": {"username": "alice"},
                        }
                    })),
                )
                .with_route(
                    &[("method", "flickr.photos.getSizes")],
                    Ok(json!({
                        "stat": "ok",
                        "sizes": {"size": [{
                            "label": "Medium", "width": 800, "height": 600,
                            "source": "https://live.staticflickr.com/1/555_m.jpg",
                        }]}
                    })),
                ),
        );
        let client = Arc::new(RateLimitedClient::with_transport(transport, &config));
        let registry =
            ExtractorRegistry::new(vec![Arc::new(FlickrExtractor::new(client, &config))]);
        build_app(Arc::new(ExtractionService::new(registry, config)))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_extract(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/extract")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app(true)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_platforms() {
        let response = test_app(true)
            .oneshot(Request::get("/platforms").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["platforms"][0], "flickr");
    }

    #[tokio::test]
    async fn test_extract_success() {
        let request = post_extract(json!({"url": "https://flickr.com/photos/alice/555"}));
        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["platform"], "flickr");
        assert_eq!(body["type"], "single");
        assert_eq!(body["images"][0]["size_label"], "Medium");
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_400() {
        let request = post_extract(json!({"url": "https://unsupported.example/x"}));
        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["kind"], "unsupported_platform");
        assert_eq!(body["error"]["details"]["url"], "https://unsupported.example/x");
    }

    #[tokio::test]
    async fn test_invalid_url_is_422() {
        let request = post_extract(json!({"url": "not-a-url"}));
        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"]["kind"], "invalid_url");
    }

    #[tokio::test]
    async fn test_bad_option_is_422() {
        let request = post_extract(json!({
            "url": "https://flickr.com/photos/alice/555",
            "options": {"max_images": 1001},
        }));
        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"]["kind"], "validation_error");
    }

    #[tokio::test]
    async fn test_unconfigured_platform_is_503() {
        let request = post_extract(json!({"url": "https://flickr.com/photos/alice/555"}));
        let response = test_app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["error"]["kind"],
            "platform_not_configured"
        );
    }
}
