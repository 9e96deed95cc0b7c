//! Service entrypoint: load and validate configuration, wire the shared
//! rate-limited client into the registry, and serve.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_extraction::{Config, ExtractionService, ExtractorRegistry, RateLimitedClient};
use server::{build_app, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server=debug,image_extraction=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting image extraction service");

    // Load environment variables
    dotenvy::dotenv().ok();

    let server_config = ServerConfig::from_env()?;

    // Fail process startup on invalid values rather than failing on first use
    let config = Config::from_env().context("failed to load extraction config")?;
    config
        .validate()
        .context("extraction config failed validation")?;

    if config.api_key("flickr").is_none() {
        tracing::warn!("FLICKR_API_KEY not set; flickr extractions will fail as unconfigured");
    }

    // One pooled client, shared throttles, injected into every extractor
    let client = Arc::new(RateLimitedClient::new(&config));
    let registry = ExtractorRegistry::with_defaults(client.clone(), &config);
    let service = Arc::new(ExtractionService::new(registry, config));

    let app = build_app(service);

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await.context("server exited")?;

    client.close().await;
    Ok(())
}
