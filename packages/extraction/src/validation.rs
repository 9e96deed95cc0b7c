//! Input gating: everything external is validated before it can reach a
//! network call.
//!
//! Validation failures are never silent — each one carries the offending
//! field or URL and a specific reason.

use std::time::Duration;

use serde_json::{Map, Value};
use url::Url;

use crate::error::{InvalidUrlError, ValidationError};
use crate::types::{ExtractOptions, OutputFormat, SizePreference};

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Conservative domain-name grammar: labels of alphanumerics and interior
/// hyphens, up to 63 chars each.
const DOMAIN_GRAMMAR: &str =
    r"^[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*$";

/// Validate an absolute HTTP(S) URL, returning the parsed form.
pub fn validate_url(url: &str) -> Result<Url, InvalidUrlError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(InvalidUrlError::new(url, "URL cannot be empty"));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| InvalidUrlError::new(trimmed, format!("failed to parse URL: {e}")))?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(InvalidUrlError::new(
            trimmed,
            format!(
                "URL scheme must be one of: {}",
                ALLOWED_SCHEMES.join(", ")
            ),
        ));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| InvalidUrlError::new(trimmed, "URL must include a domain name"))?;

    let grammar = regex::Regex::new(DOMAIN_GRAMMAR).expect("domain grammar pattern is valid");
    if !grammar.is_match(host) {
        return Err(InvalidUrlError::new(trimmed, "invalid domain name format"));
    }

    Ok(parsed)
}

/// Sanitize a URL: trim whitespace, strip control characters, then validate.
///
/// Idempotent — sanitizing an already-sanitized URL returns it unchanged.
pub fn sanitize_url(url: &str) -> Result<String, InvalidUrlError> {
    if url.is_empty() {
        return Err(InvalidUrlError::new(url, "cannot sanitize empty URL"));
    }

    let cleaned: String = url.trim().chars().filter(|c| !c.is_control()).collect();

    validate_url(&cleaned)?;
    Ok(cleaned)
}

/// Validate an API key format.
///
/// Catches unconfigured deployments (empty, too-short, or placeholder keys)
/// before they silently fail against upstream APIs.
pub fn validate_api_key(api_key: &str, platform: &str) -> Result<(), ValidationError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ValidationError::new(
            "api_key",
            api_key,
            format!("{platform} API key cannot be empty"),
        ));
    }

    if key.len() < 10 {
        return Err(ValidationError::new(
            "api_key",
            api_key,
            format!("{platform} API key must be at least 10 characters"),
        ));
    }

    let placeholder_patterns = [
        r"^your_.*_key",
        r"^replace_.*",
        r"^insert_.*",
        r"^add_.*_here",
        r"^example_.*",
        r"^test.*key",
        r"^dummy.*",
        r"^placeholder",
    ];
    for pattern in placeholder_patterns {
        let re = regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("placeholder pattern is valid");
        if re.is_match(key) {
            return Err(ValidationError::new(
                "api_key",
                api_key,
                format!("{platform} API key appears to be a placeholder value"),
            ));
        }
    }

    Ok(())
}

/// Validate extraction options against the recognized whitelist.
///
/// Unrecognized keys are dropped silently; recognized keys with bad values
/// fail with the offending field, value, and reason.
pub fn validate_options(options: &Map<String, Value>) -> Result<ExtractOptions, ValidationError> {
    let mut validated = ExtractOptions::default();

    if let Some(value) = options.get("size") {
        let size = value
            .as_str()
            .and_then(SizePreference::parse)
            .ok_or_else(|| {
                ValidationError::new(
                    "size",
                    value,
                    "size must be one of: thumbnail, small, medium, large, original",
                )
            })?;
        validated.size = Some(size);
    }

    if let Some(value) = options.get("format") {
        let format = value
            .as_str()
            .and_then(OutputFormat::parse)
            .ok_or_else(|| {
                ValidationError::new("format", value, "format must be one of: json, detailed")
            })?;
        validated.format = Some(format);
    }

    if let Some(value) = options.get("timeout") {
        let seconds = value.as_f64().ok_or_else(|| {
            ValidationError::new("timeout", value, "timeout must be a number of seconds")
        })?;
        if seconds <= 0.0 {
            return Err(ValidationError::new(
                "timeout",
                value,
                "timeout must be positive",
            ));
        }
        if seconds > 300.0 {
            return Err(ValidationError::new(
                "timeout",
                value,
                "timeout cannot exceed 300 seconds",
            ));
        }
        validated.timeout = Some(Duration::from_secs_f64(seconds));
    }

    if let Some(value) = options.get("max_images") {
        let count = value.as_u64().ok_or_else(|| {
            ValidationError::new("max_images", value, "max_images must be a positive integer")
        })?;
        if count == 0 {
            return Err(ValidationError::new(
                "max_images",
                value,
                "max_images must be a positive integer",
            ));
        }
        if count > 1000 {
            return Err(ValidationError::new(
                "max_images",
                value,
                "max_images cannot exceed 1000",
            ));
        }
        validated.max_images = Some(count as usize);
    }

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_accepts_well_formed_urls() {
        assert!(validate_url("https://flickr.com/photos/alice/555").is_ok());
        assert!(validate_url("http://example.com/").is_ok());
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(validate_url("").is_err());
        assert!(validate_url("   ").is_err());
    }

    #[test]
    fn test_rejects_missing_or_bad_scheme() {
        assert!(validate_url("flickr.com/photos/alice/555").is_err());
        assert!(validate_url("ftp://example.com/file").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_rejects_malformed_host() {
        assert!(validate_url("https://-bad-.example/").is_err());
        assert!(validate_url("https://exa_mple.com/").is_err());
    }

    #[test]
    fn test_sanitize_strips_whitespace_and_controls() {
        let url = "  https://flickr.com/photos/alice/555\n";
        assert_eq!(
            sanitize_url(url).unwrap(),
            "https://flickr.com/photos/alice/555"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_url(" https://flickr.com/photos/alice/555 ").unwrap();
        let twice = sanitize_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    proptest! {
        #[test]
        fn prop_sanitize_idempotent(path in "[a-z0-9/]{0,20}") {
            let url = format!("  https://example.com/{path}\t");
            if let Ok(once) = sanitize_url(&url) {
                let twice = sanitize_url(&once).unwrap();
                prop_assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn test_api_key_rejects_short_and_placeholder() {
        assert!(validate_api_key("", "flickr").is_err());
        assert!(validate_api_key("short", "flickr").is_err());
        assert!(validate_api_key("your_flickr_key", "flickr").is_err());
        assert!(validate_api_key("DUMMY-KEY-123456", "flickr").is_err());
        assert!(validate_api_key("a1b2c3d4e5f6a7b8", "flickr").is_ok());
    }

    #[test]
    fn test_options_drops_unknown_keys() {
        let mut options = Map::new();
        options.insert("frobnicate".into(), json!(true));
        let validated = validate_options(&options).unwrap();
        assert!(validated.size.is_none());
        assert!(validated.max_images.is_none());
    }

    #[test]
    fn test_options_accepts_whitelisted_values() {
        let mut options = Map::new();
        options.insert("size".into(), json!("large"));
        options.insert("format".into(), json!("detailed"));
        options.insert("timeout".into(), json!(12.5));
        options.insert("max_images".into(), json!(25));
        let validated = validate_options(&options).unwrap();
        assert_eq!(validated.size, Some(SizePreference::Large));
        assert_eq!(validated.format, Some(OutputFormat::Detailed));
        assert_eq!(validated.timeout, Some(Duration::from_secs_f64(12.5)));
        assert_eq!(validated.max_images, Some(25));
    }

    #[test]
    fn test_options_rejects_out_of_range() {
        let mut options = Map::new();
        options.insert("timeout".into(), json!(301));
        let err = validate_options(&options).unwrap_err();
        assert_eq!(err.field, "timeout");
        assert!(err.reason.contains("300"));

        let mut options = Map::new();
        options.insert("max_images".into(), json!(0));
        assert_eq!(validate_options(&options).unwrap_err().field, "max_images");

        let mut options = Map::new();
        options.insert("max_images".into(), json!(1001));
        assert_eq!(validate_options(&options).unwrap_err().field, "max_images");

        let mut options = Map::new();
        options.insert("size".into(), json!("gigantic"));
        assert_eq!(validate_options(&options).unwrap_err().field, "size");
    }

    #[test]
    fn test_options_rejects_wrong_types() {
        let mut options = Map::new();
        options.insert("max_images".into(), json!("ten"));
        assert!(validate_options(&options).is_err());

        let mut options = Map::new();
        options.insert("timeout".into(), json!(true));
        assert!(validate_options(&options).is_err());
    }
}
