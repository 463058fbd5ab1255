//! Engine entry point

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::{DEFAULT_MAX_CONCURRENCY, FeedConfig};
use crate::feed::aggregator::{aggregate_discovered, aggregate_watched};
use crate::feed::detector::{AnomalyDetector, NullDetector};
use crate::feed::error::RegistryError;
use crate::feed::ordering::finalize;
use crate::feed::registries::NpmRegistry;
use crate::feed::registry::Registry;
use crate::feed::types::{PollMode, PollOutcome};

/// Options selecting how a poll discovers packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// `None` polls the activity feed, `Some` polls exactly these names
    pub packages: Option<Vec<String>>,
    /// Upper bound on concurrent package resolutions
    pub max_concurrency: usize,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            packages: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Stateless poller over one registry
pub struct Poller {
    registry: Arc<dyn Registry>,
    detector: Arc<dyn AnomalyDetector>,
    options: PollOptions,
}

impl Poller {
    pub fn new(
        registry: Arc<dyn Registry>,
        detector: Arc<dyn AnomalyDetector>,
        options: PollOptions,
    ) -> Self {
        Self {
            registry,
            detector,
            options,
        }
    }

    /// Builds an npm poller from configuration, without an anomaly detector
    pub fn from_config(config: &FeedConfig) -> Result<Self, RegistryError> {
        let registry = NpmRegistry::new(&config.base_url, config.timeout())?;
        Ok(Self::new(
            Arc::new(registry),
            Arc::new(NullDetector),
            PollOptions {
                packages: config.packages.clone(),
                max_concurrency: config.max_concurrency,
            },
        ))
    }

    pub fn mode(&self) -> PollMode {
        match self.options.packages {
            Some(_) => PollMode::WatchList,
            None => PollMode::Discovery,
        }
    }

    /// Returns releases published strictly after `cutoff`, newest first,
    /// together with every error encountered
    pub async fn poll(&self, cutoff: DateTime<Utc>) -> PollOutcome {
        let registry = self.registry.as_ref();
        let max_concurrency = self.options.max_concurrency;

        let aggregated = match &self.options.packages {
            None => aggregate_discovered(registry, max_concurrency).await,
            Some(names) => aggregate_watched(registry, names, max_concurrency).await,
        };

        let outcome = finalize(
            aggregated,
            cutoff,
            self.mode(),
            registry.feed_name(),
            self.detector.as_ref(),
        );

        info!(
            "Polled {} feed: {} releases, {} errors",
            registry.feed_name(),
            outcome.releases.len(),
            outcome.errors.len()
        );
        outcome
    }
}
