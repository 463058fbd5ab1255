//! Concurrent resolution of package version histories
//!
//! Both modes fan out one resolution per package, bounded by
//! `max_concurrency`, and fan in exactly one tagged outcome per package.
//! A failing package never stops its siblings.

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::feed::error::{PollError, RegistryError};
use crate::feed::registry::Registry;
use crate::feed::types::{FeedMention, PollMode, PollOutcome, ReleaseEvent, Resolution};

/// How many resolved versions of a package become releases
#[derive(Debug, Clone, Copy)]
enum Take {
    Newest(usize),
    All,
}

/// Tagged result of one resolution
struct TaskOutcome {
    name: String,
    take: Take,
    result: Result<Resolution, RegistryError>,
}

/// Polls the packages mentioned in the activity feed
///
/// A package mentioned `k` times yields its `k` newest versions. Unpublished
/// packages are dropped silently. If the feed itself cannot be fetched the
/// outcome holds that single error and nothing else is attempted.
pub async fn aggregate_discovered(registry: &dyn Registry, max_concurrency: usize) -> PollOutcome {
    let mentions = match registry.fetch_activity().await {
        Ok(mentions) => mentions,
        Err(e) => {
            warn!("Failed to fetch {} activity feed: {}", registry.feed_name(), e);
            return PollOutcome::new(Vec::new(), vec![PollError::Feed(e)]);
        }
    };

    let counts = count_mentions(&mentions);
    info!(
        "{} activity feed mentioned {} unique packages",
        registry.feed_name(),
        counts.len()
    );

    let tasks = counts
        .into_iter()
        .map(|(name, count)| (name, Take::Newest(count)))
        .collect();

    let outcomes = resolve_concurrently(registry, tasks, max_concurrency).await;
    fan_in(registry.feed_name(), outcomes, PollMode::Discovery)
}

/// Polls an explicit list of packages
///
/// Every resolved version becomes a release. Duplicate names are resolved
/// once per occurrence. Unpublished packages are reported as errors since
/// the caller asked for them by name.
pub async fn aggregate_watched(
    registry: &dyn Registry,
    names: &[String],
    max_concurrency: usize,
) -> PollOutcome {
    let tasks = names.iter().map(|name| (name.clone(), Take::All)).collect();

    let outcomes = resolve_concurrently(registry, tasks, max_concurrency).await;
    fan_in(registry.feed_name(), outcomes, PollMode::WatchList)
}

/// Counts mentions per package, keeping first-seen order
fn count_mentions(mentions: &[FeedMention]) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for mention in mentions {
        *counts.entry(mention.name.clone()).or_default() += 1;
    }
    counts
}

async fn resolve_concurrently(
    registry: &dyn Registry,
    tasks: Vec<(String, Take)>,
    max_concurrency: usize,
) -> Vec<TaskOutcome> {
    stream::iter(tasks)
        .map(|(name, take)| async move {
            let result = registry.resolve_versions(&name).await;
            TaskOutcome { name, take, result }
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await
}

fn fan_in(feed: &str, outcomes: Vec<TaskOutcome>, mode: PollMode) -> PollOutcome {
    let mut releases = Vec::new();
    let mut errors = Vec::new();

    for TaskOutcome { name, take, result } in outcomes {
        match result {
            Ok(Resolution::Versions(versions)) => {
                let keep = match take {
                    Take::Newest(count) => count,
                    Take::All => versions.len(),
                };
                debug!(
                    "Resolved {} versions for {}, keeping {}",
                    versions.len(),
                    name,
                    keep.min(versions.len())
                );
                releases.extend(
                    versions
                        .into_iter()
                        .take(keep)
                        .map(|record| ReleaseEvent::new(feed, &name, record)),
                );
            }
            Ok(Resolution::Unpublished) => match mode {
                PollMode::Discovery => debug!("Skipping unpublished package {}", name),
                PollMode::WatchList => {
                    warn!("Watched package {} is unpublished", name);
                    errors.push(PollError::Unpublished { name });
                }
            },
            Err(source) => {
                if source.is_transport() {
                    warn!("Failed to poll package {}: {}", name, source);
                } else {
                    error!("Failed to poll package {}: {}", name, source);
                }
                errors.push(PollError::PackagePoll { name, source });
            }
        }
    }

    PollOutcome::new(releases, errors)
}
