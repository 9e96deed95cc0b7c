//! Platform Image URL Extraction Library
//!
//! Extracts direct image URLs from third-party hosting platforms (Flickr
//! first) by calling their public REST APIs and normalizing the results into
//! a uniform schema.
//!
//! # Design
//!
//! - One rate-limited HTTP client per process, shared by every extractor, so
//!   all traffic to a domain is paced by the same throttle.
//! - Extractors are a capability set (`platform_name` / `matches` /
//!   `extract`), registered once in an ordered registry with
//!   first-registered-wins dispatch.
//! - All external input is validated before it can reach a network call, and
//!   every failure carries a machine-readable kind plus a structured detail
//!   map.
//!
//! # Usage
//!
//! ```rust,ignore
//! use image_extraction::{Config, ExtractionService, ExtractorRegistry, RateLimitedClient};
//! use std::sync::Arc;
//!
//! let config = Config::from_env()?;
//! config.validate()?;
//!
//! let client = Arc::new(RateLimitedClient::new(&config));
//! let registry = ExtractorRegistry::with_defaults(client, &config);
//! let service = ExtractionService::new(registry, config);
//!
//! let result = service.extract("https://flickr.com/photos/alice/555", &Default::default()).await?;
//! ```
//!
//! # Modules
//!
//! - [`config`] - Environment-loaded, eagerly validated configuration
//! - [`error`] - Typed error taxonomy with structured details
//! - [`http`] - Rate-limited, retrying HTTP client
//! - [`validation`] - URL, option, and credential gating
//! - [`registry`] - Ordered extractor registry
//! - [`platforms`] - Platform extractors (Flickr)
//! - [`service`] - The `extract(url, options)` façade
//! - [`testing`] - Mock transport for tests

pub mod config;
pub mod error;
pub mod extractor;
pub mod http;
pub mod platforms;
pub mod registry;
pub mod secrets;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export core types at crate root
pub use config::{Config, ExtractorConfig, HttpConfig, RateLimits};
pub use error::{ExtractError, HttpError, InvalidUrlError, Result, ValidationError};
pub use extractor::Extractor;
pub use http::{HttpTransport, Method, RateLimitedClient, Transport};
pub use platforms::FlickrExtractor;
pub use registry::ExtractorRegistry;
pub use secrets::SecretString;
pub use service::ExtractionService;
pub use types::{
    ExtractOptions, ExtractionRequest, ExtractionResult, ImageRecord, OutputFormat, ResultKind,
    SizePreference,
};
pub use validation::{sanitize_url, validate_api_key, validate_options, validate_url};
