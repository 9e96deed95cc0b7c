use thiserror::Error;

/// Errors returned by the extractor service client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("service error {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;
