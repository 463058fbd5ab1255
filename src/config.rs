use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::feed::registries::npm::DEFAULT_BASE_URL;

// =============================================================================
// Fetch-related constants
// =============================================================================

/// Timeout for a single registry request in seconds
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Default upper bound on concurrent package resolutions
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Poller configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedConfig {
    pub base_url: String,
    /// Watch list. Absent means the activity feed is polled instead.
    pub packages: Option<Vec<String>>,
    pub max_concurrency: usize,
    pub timeout_secs: u64,
    pub log: LogConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            packages: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout_secs: FETCH_TIMEOUT_SECS,
            log: LogConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Reads a JSON config file; missing fields use their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Log to this file instead of stderr
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Returns the path to the data directory for registry-feeds.
/// Uses $XDG_DATA_HOME/registry-feeds if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/registry-feeds,
/// or ./registry-feeds if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("registry-feeds.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("registry-feeds")
}
