//! API key wrapper that cannot leak through logs or debug output.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A platform API key held in zeroizing memory.
///
/// Keys travel from config into extractor request parameters; the wrapper has
/// no `Display` impl, so accidental `{}` interpolation is a compile error,
/// and `Debug` prints a redaction marker.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(SecretBox::new(value.into()))
    }

    /// Reveal the key. Only call this when building an upstream request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
