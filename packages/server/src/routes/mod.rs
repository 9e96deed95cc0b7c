//! HTTP route handlers.

mod extract;
mod health;

pub use extract::{extract_handler, platforms_handler};
pub use health::health_handler;
