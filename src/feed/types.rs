//! Common types shared by the polling engine

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::feed::error::PollError;

/// A package name as it appears in one activity-feed entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMention {
    pub name: String,
}

impl FeedMention {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A single (version, publish time) pair from a package's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    /// Opaque version identifier, never parsed as semver
    pub version: String,
    pub published: DateTime<Utc>,
}

impl VersionRecord {
    pub fn new(version: impl Into<String>, published: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            published,
        }
    }
}

/// Outcome of resolving one package's version history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// All versions, ordered from newest to oldest
    Versions(Vec<VersionRecord>),
    /// The registry has withdrawn every version of the package
    Unpublished,
}

/// One newly published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseEvent {
    pub name: String,
    pub version: String,
    pub published: DateTime<Utc>,
    /// Tag of the feed that produced this release (e.g. "npm")
    pub feed: String,
}

impl ReleaseEvent {
    pub fn new(feed: &str, name: &str, record: VersionRecord) -> Self {
        Self {
            name: name.to_string(),
            version: record.version,
            published: record.published,
            feed: feed.to_string(),
        }
    }
}

/// Result of a single poll call
///
/// Releases are ordered newest first. Errors are in the order they were
/// collected; `NoPackagesPolled` is always last when present.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub releases: Vec<ReleaseEvent>,
    pub errors: Vec<PollError>,
}

impl PollOutcome {
    pub fn new(releases: Vec<ReleaseEvent>, errors: Vec<PollError>) -> Self {
        Self { releases, errors }
    }
}

/// How package names are chosen for a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Names come from the registry's activity feed
    Discovery,
    /// Names come from an explicit watch list
    WatchList,
}
