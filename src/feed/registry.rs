//! Registry trait for discovering packages and resolving their releases

#[cfg(test)]
use mockall::automock;

use crate::feed::error::RegistryError;
use crate::feed::types::{FeedMention, Resolution};

/// Trait for a package registry the engine can poll
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Tag attached to every release produced from this registry
    fn feed_name(&self) -> &'static str;

    /// Fetches the recently-active package feed
    ///
    /// # Returns
    /// * `Ok(Vec<FeedMention>)` - One mention per feed entry, in feed order.
    ///   A name may repeat.
    /// * `Err(RegistryError)` - Transport failure or unparseable document
    async fn fetch_activity(&self) -> Result<Vec<FeedMention>, RegistryError>;

    /// Fetches the full version history of a package
    ///
    /// # Arguments
    /// * `package_name` - The name of the package (e.g., "@types/node")
    ///
    /// # Returns
    /// * `Ok(Resolution::Versions)` - Versions ordered from newest to oldest
    /// * `Ok(Resolution::Unpublished)` - The package has been withdrawn
    /// * `Err(RegistryError)` - If the fetch or decode fails
    async fn resolve_versions(&self, package_name: &str) -> Result<Resolution, RegistryError>;
}
