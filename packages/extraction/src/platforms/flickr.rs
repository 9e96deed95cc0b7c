//! Flickr extractor.
//!
//! Talks to the Flickr REST API (`flickr.photos.getInfo`,
//! `flickr.photos.getSizes`, `flickr.photosets.getInfo`,
//! `flickr.photosets.getPhotos`). Single photos resolve to one record per
//! size variant; photosets resolve each member to its largest variant, with
//! bounded concurrent batches and partial-success semantics.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ExtractError, HttpError, InvalidUrlError, Result};
use crate::extractor::{compile_patterns, Extractor};
use crate::http::RateLimitedClient;
use crate::secrets::SecretString;
use crate::types::{ExtractOptions, ExtractionResult, ImageRecord, ResultKind};

const REST_ENDPOINT: &str = "https://api.flickr.com/services/rest/";

const URL_PATTERNS: [&str; 4] = [
    r"flickr\.com/photos/[^/]+/\d+",
    r"flickr\.com/p/\w+",
    r"flickr\.com/photos/[^/]+/albums/\d+",
    r"flickr\.com/photos/[^/]+/sets/\d+",
];

/// What a Flickr URL identifies.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FlickrTarget {
    Photo(String),
    Photoset(String),
}

pub struct FlickrExtractor {
    client: Arc<RateLimitedClient>,
    api_key: Option<SecretString>,
    batch_size: usize,
    patterns: Vec<Regex>,
}

impl FlickrExtractor {
    pub fn new(client: Arc<RateLimitedClient>, config: &Config) -> Self {
        Self {
            client,
            api_key: config.api_key("flickr").cloned(),
            batch_size: config.extractors.batch_size,
            patterns: compile_patterns(&URL_PATTERNS),
        }
    }

    /// Parse out the photoset or photo identifier.
    ///
    /// Photoset patterns are tried first: an album URL also contains a
    /// `/photos/<user>/` segment and must not be mistaken for a single photo.
    fn parse_target(url: &str) -> std::result::Result<FlickrTarget, InvalidUrlError> {
        let photoset_patterns = [r"/albums/(\d+)", r"/sets/(\d+)"];
        for pattern in photoset_patterns {
            let re = Regex::new(pattern).expect("photoset pattern is valid");
            if let Some(caps) = re.captures(url) {
                return Ok(FlickrTarget::Photoset(caps[1].to_string()));
            }
        }

        let photo_patterns = [r"/photos/[^/]+/(\d+)", r"/p/(\w+)"];
        for pattern in photo_patterns {
            let re = Regex::new(pattern).expect("photo pattern is valid");
            if let Some(caps) = re.captures(url) {
                return Ok(FlickrTarget::Photo(caps[1].to_string()));
            }
        }

        Err(InvalidUrlError::new(
            url,
            "URL does not match any supported Flickr URL pattern",
        ))
    }

    /// Call one REST method and unwrap the response envelope.
    ///
    /// Flickr wraps every payload in `{"stat": "ok"|"fail", ...}`; a "fail"
    /// envelope becomes an API error carrying the upstream code and message
    /// before any payload field is touched.
    async fn call(&self, method: &str, id_param: (&str, &str), key: &SecretString) -> Result<Value> {
        let params = [
            ("method", method.to_string()),
            ("api_key", key.expose().to_string()),
            (id_param.0, id_param.1.to_string()),
            ("format", "json".to_string()),
            ("nojsoncallback", "1".to_string()),
        ];

        let body = self
            .client
            .get(REST_ENDPOINT, &params)
            .await
            .map_err(|e| match e {
                HttpError::Status {
                    status: 429,
                    retry_after,
                    ..
                } => ExtractError::RateLimited {
                    platform: "flickr".to_string(),
                    retry_after,
                },
                other => ExtractError::Http(other),
            })?;

        if body.get("stat").and_then(Value::as_str) != Some("ok") {
            return Err(ExtractError::Api {
                platform: "flickr",
                code: body.get("code").and_then(Value::as_i64),
                message: body
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown API error")
                    .to_string(),
            });
        }

        Ok(body)
    }

    async fn extract_single(&self, photo_id: &str, key: &SecretString) -> Result<ExtractionResult> {
        // Metadata strictly before sizes
        let info_body = self
            .call("flickr.photos.getInfo", ("photo_id", photo_id), key)
            .await?;
        let sizes_body = self
            .call("flickr.photos.getSizes", ("photo_id", photo_id), key)
            .await?;

        let info: PhotoInfo = parse_payload(&info_body, "photo")?;
        let sizes: SizeList = parse_payload(&sizes_body, "sizes")?;

        let description = info.description.and_then(|d| {
            if d.content.is_empty() {
                None
            } else {
                Some(d.content)
            }
        });

        let images: Vec<ImageRecord> = sizes
            .size
            .into_iter()
            .map(|variant| ImageRecord {
                url: variant.source,
                title: Some(info.title.content.clone()),
                description: description.clone(),
                width: Some(variant.width),
                height: Some(variant.height),
                size_label: Some(variant.label),
            })
            .collect();

        let mut metadata = Map::new();
        metadata.insert("photo_id".into(), json!(photo_id));
        metadata.insert("owner".into(), json!(info.owner.username));
        metadata.insert(
            "date_taken".into(),
            json!(info.dates.and_then(|d| d.taken)),
        );

        Ok(ExtractionResult {
            platform: self.platform_name().to_string(),
            kind: ResultKind::Single,
            images,
            metadata,
        })
    }

    async fn extract_photoset(
        &self,
        photoset_id: &str,
        options: &ExtractOptions,
        key: &SecretString,
    ) -> Result<ExtractionResult> {
        let info_body = self
            .call("flickr.photosets.getInfo", ("photoset_id", photoset_id), key)
            .await?;
        let photos_body = self
            .call(
                "flickr.photosets.getPhotos",
                ("photoset_id", photoset_id),
                key,
            )
            .await?;

        let info: PhotosetInfo = parse_payload(&info_body, "photoset")?;
        let listing: PhotosetPhotos = parse_payload(&photos_body, "photoset")?;

        let mut members = listing.photo;
        if let Some(cap) = options.max_images {
            members.truncate(cap);
        }

        // Members within one batch resolve concurrently; batches run in
        // sequence and join_all preserves member order in the output.
        let mut images: Vec<ImageRecord> = Vec::with_capacity(members.len());
        for batch in members.chunks(self.batch_size) {
            let fetched = futures::future::join_all(
                batch.iter().map(|member| self.largest_variant(member, key)),
            )
            .await;
            images.extend(fetched.into_iter().flatten());
        }

        if images.is_empty() {
            return Err(ExtractError::Extraction {
                url: format!("photoset/{photoset_id}"),
                platform: "flickr",
                reason: "no photoset member could be resolved".to_string(),
            });
        }

        let mut metadata = Map::new();
        metadata.insert("photoset_id".into(), json!(photoset_id));
        metadata.insert("title".into(), json!(info.title.content));
        metadata.insert(
            "description".into(),
            json!(info.description.map(|d| d.content).unwrap_or_default()),
        );
        metadata.insert("photo_count".into(), json!(images.len()));

        Ok(ExtractionResult {
            platform: self.platform_name().to_string(),
            kind: ResultKind::Album,
            images,
            metadata,
        })
    }

    /// Resolve one photoset member to its largest size variant.
    ///
    /// A failure here is logged and the member dropped; partial success is
    /// the intended semantics for collections.
    async fn largest_variant(
        &self,
        member: &PhotosetMember,
        key: &SecretString,
    ) -> Option<ImageRecord> {
        let sizes_body = match self
            .call("flickr.photos.getSizes", ("photo_id", &member.id), key)
            .await
        {
            Ok(body) => body,
            Err(e) => {
                warn!(photo_id = %member.id, error = %e, "failed to fetch sizes for photoset member");
                return None;
            }
        };

        let sizes: SizeList = match parse_payload(&sizes_body, "sizes") {
            Ok(sizes) => sizes,
            Err(e) => {
                warn!(photo_id = %member.id, error = %e, "unexpected sizes payload for photoset member");
                return None;
            }
        };

        // Single deterministic max pass: ties keep the first (upstream
        // ordering), no re-sort.
        let mut variants = sizes.size.into_iter();
        let mut largest = variants.next()?;
        for candidate in variants {
            if pixel_area(&candidate) > pixel_area(&largest) {
                largest = candidate;
            }
        }

        Some(ImageRecord {
            url: largest.source,
            title: Some(member.title.clone()),
            description: None,
            width: Some(largest.width),
            height: Some(largest.height),
            size_label: Some(largest.label),
        })
    }
}

#[async_trait]
impl Extractor for FlickrExtractor {
    fn platform_name(&self) -> &'static str {
        "flickr"
    }

    fn url_patterns(&self) -> &[Regex] {
        &self.patterns
    }

    async fn extract(&self, url: &str, options: &ExtractOptions) -> Result<ExtractionResult> {
        // Credential precondition comes first: never touch the network
        // without a usable key.
        let key = self
            .api_key
            .clone()
            .ok_or(ExtractError::PlatformNotConfigured {
                platform: "flickr",
                env_var: "FLICKR_API_KEY",
            })?;

        let target = Self::parse_target(url)?;
        debug!(url, ?target, "resolved flickr target");

        match target {
            FlickrTarget::Photo(photo_id) => self.extract_single(&photo_id, &key).await,
            FlickrTarget::Photoset(photoset_id) => {
                self.extract_photoset(&photoset_id, options, &key).await
            }
        }
    }
}

fn pixel_area(variant: &SizeVariant) -> u64 {
    variant.width as u64 * variant.height as u64
}

/// Pull one named payload object out of an "ok" envelope.
fn parse_payload<T: serde::de::DeserializeOwned>(body: &Value, field: &str) -> Result<T> {
    let payload = body.get(field).ok_or_else(|| ExtractError::Extraction {
        url: REST_ENDPOINT.to_string(),
        platform: "flickr",
        reason: format!("response missing '{field}' payload"),
    })?;
    serde_json::from_value(payload.clone()).map_err(|e| ExtractError::Extraction {
        url: REST_ENDPOINT.to_string(),
        platform: "flickr",
        reason: format!("unexpected '{field}' payload shape: {e}"),
    })
}

/// Flickr's `{"_content": "..."}` text wrapper.
#[derive(Debug, Deserialize)]
struct TextContent {
    #[serde(rename = "_content", default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct PhotoInfo {
    title: TextContent,
    #[serde(default)]
    description: Option<TextContent>,
    owner: PhotoOwner,
    #[serde(default)]
    dates: Option<PhotoDates>,
}

#[derive(Debug, Deserialize)]
struct PhotoOwner {
    username: String,
}

#[derive(Debug, Deserialize)]
struct PhotoDates {
    #[serde(default)]
    taken: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SizeList {
    size: Vec<SizeVariant>,
}

#[derive(Debug, Deserialize)]
struct SizeVariant {
    label: String,
    #[serde(deserialize_with = "dimension")]
    width: u32,
    #[serde(deserialize_with = "dimension")]
    height: u32,
    source: String,
}

#[derive(Debug, Deserialize)]
struct PhotosetInfo {
    title: TextContent,
    #[serde(default)]
    description: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
struct PhotosetPhotos {
    photo: Vec<PhotosetMember>,
}

#[derive(Debug, Clone, Deserialize)]
struct PhotosetMember {
    id: String,
    #[serde(default)]
    title: String,
}

/// Flickr reports size dimensions as either JSON numbers or strings.
fn dimension<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as u32)
            .ok_or_else(|| serde::de::Error::custom("dimension must be a non-negative integer")),
        Value::String(s) => s
            .parse::<u32>()
            .map_err(|_| serde::de::Error::custom(format!("invalid dimension '{s}'"))),
        other => Err(serde::de::Error::custom(format!(
            "dimension must be a number or string, got {other}"
        ))),
    }
}
