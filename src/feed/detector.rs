//! Outbound interface to the lossy-feed / anomaly detector

#[cfg(test)]
use mockall::automock;

use crate::feed::types::ReleaseEvent;

/// Observer of the full, sorted release stream of a discovery poll
///
/// Called before the cutoff is applied. A returned error is logged by the
/// caller and never fails the poll.
#[cfg_attr(test, automock)]
pub trait AnomalyDetector: Send + Sync {
    fn notify(&self, feed: &str, releases: &[ReleaseEvent]) -> anyhow::Result<()>;
}

/// Detector that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDetector;

impl AnomalyDetector for NullDetector {
    fn notify(&self, _feed: &str, _releases: &[ReleaseEvent]) -> anyhow::Result<()> {
        Ok(())
    }
}
