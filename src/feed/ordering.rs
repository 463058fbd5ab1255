//! Ordering and cutoff stage

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::feed::detector::AnomalyDetector;
use crate::feed::error::PollError;
use crate::feed::types::{PollMode, PollOutcome, ReleaseEvent};

/// Sorts, deduplicates and cutoff-filters the aggregated releases
///
/// - No releases at all appends [`PollError::NoPackagesPolled`].
/// - Releases are sorted newest first, then by package name. Releases of one
///   package published at the same instant keep their resolved order.
/// - In discovery mode the detector sees the full sorted stream before the
///   cutoff is applied.
/// - Only releases published strictly after `cutoff` are returned.
pub fn finalize(
    aggregated: PollOutcome,
    cutoff: DateTime<Utc>,
    mode: PollMode,
    feed: &str,
    detector: &dyn AnomalyDetector,
) -> PollOutcome {
    let PollOutcome {
        mut releases,
        mut errors,
    } = aggregated;

    if releases.is_empty() {
        errors.push(PollError::NoPackagesPolled);
        return PollOutcome::new(Vec::new(), errors);
    }

    releases.sort_by(|a, b| {
        b.published
            .cmp(&a.published)
            .then_with(|| a.name.cmp(&b.name))
    });
    dedup_releases(&mut releases);

    if mode == PollMode::Discovery {
        if let Err(e) = detector.notify(feed, &releases) {
            warn!("Anomaly detector failed for {} feed: {:#}", feed, e);
        }
    }

    let total = releases.len();
    releases.retain(|release| release.published > cutoff);
    debug!(
        "{} of {} releases are newer than {}",
        releases.len(),
        total,
        cutoff
    );

    PollOutcome::new(releases, errors)
}

/// Keeps the first occurrence of every (name, version) pair
fn dedup_releases(releases: &mut Vec<ReleaseEvent>) {
    let mut seen = HashSet::new();
    releases.retain(|release| seen.insert((release.name.clone(), release.version.clone())));
}
