//! Image URL extraction HTTP service.
//!
//! Thin axum surface over the `image-extraction` library: one logical
//! operation (`POST /extract`) plus `GET /platforms` and `GET /health`.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;

pub use app::{build_app, AppState};
pub use config::ServerConfig;
pub use error::ApiError;
