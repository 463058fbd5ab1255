//! npm registry implementation
//!
//! Recently-active packages come from the registry's RSS feed, version
//! histories from the `time` object of each package document.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::feed::error::RegistryError;
use crate::feed::registry::Registry;
use crate::feed::types::{FeedMention, Resolution, VersionRecord};

/// Default base URL for npm registry
pub const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Tag attached to releases discovered on npm
pub const FEED_NAME: &str = "npm";

const ACTIVITY_PATH: &str = "/-/rss";

/// Keys of the `time` object that are not versions
const BOOKKEEPING_KEYS: &[&str] = &["created", "modified"];

/// Present in `time` once a package has been entirely unpublished.
/// https://docs.npmjs.com/policies/unpublish
const UNPUBLISHED_KEY: &str = "unpublished";

/// Package document returned by the registry
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    /// Version -> publish time, in document order
    time: Option<IndexMap<String, serde_json::Value>>,
}

/// Registry implementation for the npm registry API
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry against `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent("registry-feeds")
            .timeout(timeout)
            .build()
            .map_err(RegistryError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }

    async fn get(&self, path: &str, target: &str) -> Result<reqwest::Response, RegistryError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("Fetching {}", url);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|source| RegistryError::Network {
                    target: target.to_string(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::Status {
                target: target.to_string(),
                status,
            });
        }

        Ok(response)
    }

    async fn read_body(response: reqwest::Response, target: &str) -> Result<Vec<u8>, RegistryError> {
        let body = response
            .bytes()
            .await
            .map_err(|source| RegistryError::Network {
                target: target.to_string(),
                source,
            })?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Registry for NpmRegistry {
    fn feed_name(&self) -> &'static str {
        FEED_NAME
    }

    async fn fetch_activity(&self) -> Result<Vec<FeedMention>, RegistryError> {
        let response = self.get(ACTIVITY_PATH, ACTIVITY_PATH).await?;
        let body = Self::read_body(response, ACTIVITY_PATH).await?;
        let mentions = parse_activity(&body)?;

        debug!("Activity feed mentioned {} packages", mentions.len());
        Ok(mentions)
    }

    async fn resolve_versions(&self, package_name: &str) -> Result<Resolution, RegistryError> {
        let path = Self::encode_package_name(package_name);
        let response = self.get(&path, package_name).await?;
        let body = Self::read_body(response, package_name).await?;
        parse_versions(package_name, &body)
    }
}

/// Decodes the activity feed into name mentions
///
/// The body is decoded lossily: invalid UTF-8 becomes U+FFFD, which is then
/// stripped from the name. Only an unparseable document is an error.
fn parse_activity(body: &[u8]) -> Result<Vec<FeedMention>, RegistryError> {
    let text = String::from_utf8_lossy(body);

    Ok(item_titles(&text)?
        .iter()
        .map(|title| clean_name(title))
        .filter(|name| !name.is_empty())
        .map(FeedMention::new)
        .collect())
}

/// Collects the text of every `channel > item > title` below the root element
///
/// The root is not required to carry an RSS `version` attribute and namespace
/// prefixes such as `dc:` are matched literally.
fn item_titles(xml: &str) -> Result<Vec<String>, RegistryError> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut title: Option<String> = None;
    let mut titles = Vec::new();

    loop {
        match reader.read_event().map_err(decode_error)? {
            Event::Start(tag) => {
                seen_root = true;
                open.push(tag.name().as_ref().to_vec());
                if is_item_title(&open) {
                    title = Some(String::new());
                }
            }
            Event::Empty(_) => seen_root = true,
            Event::Text(text) => {
                if let Some(title) = title.as_mut() {
                    title.push_str(&text.unescape().map_err(decode_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(title) = title.as_mut() {
                    title.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if is_item_title(&open) {
                    titles.extend(title.take());
                }
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(decode_error("no root element"));
    }
    if !open.is_empty() {
        return Err(decode_error("unexpected end of document"));
    }
    Ok(titles)
}

fn is_item_title(open: &[Vec<u8>]) -> bool {
    matches!(
        open,
        [_, channel, item, title]
            if channel == b"channel" && item == b"item" && title == b"title"
    )
}

fn decode_error(err: impl std::fmt::Display) -> RegistryError {
    RegistryError::decode(ACTIVITY_PATH, err.to_string())
}

fn clean_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Extracts the newest-first version history from a package document
fn parse_versions(package_name: &str, body: &[u8]) -> Result<Resolution, RegistryError> {
    let package: NpmPackageResponse = serde_json::from_slice(body)
        .map_err(|e| RegistryError::decode(package_name, e.to_string()))?;

    let Some(time) = package.time else {
        return Err(RegistryError::decode(package_name, "'time' not found"));
    };

    if time.contains_key(UNPUBLISHED_KEY) {
        debug!("{} is unpublished", package_name);
        return Ok(Resolution::Unpublished);
    }

    let mut versions = time
        .into_iter()
        .filter(|(key, _)| !BOOKKEEPING_KEYS.contains(&key.as_str()))
        .map(|(version, value)| -> Result<VersionRecord, RegistryError> {
            let published = parse_timestamp(&value).ok_or_else(|| {
                RegistryError::decode(
                    package_name,
                    format!("invalid timestamp for version {}: {}", version, value),
                )
            })?;
            Ok(VersionRecord::new(version, published))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Stable: versions published at the same instant keep document order
    versions.sort_by(|a, b| b.published.cmp(&a.published));

    Ok(Resolution::Versions(versions))
}

fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let stamp = value.as_str()?;
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
