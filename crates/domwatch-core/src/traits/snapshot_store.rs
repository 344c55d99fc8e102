// # Snapshot Store Trait
//
// Defines the interface for best-effort persistence of the watch-list.
//
// ## Purpose
//
// The watch-list lives in memory. A snapshot store lets it survive
// restarts: it is loaded once at startup and overwritten after every
// mutation. Durability is best-effort; a store that cannot be reached
// leaves the watcher running in memory only.
//
// ## Implementations
//
// - File-based: JSON document with atomic replace
// - In-memory: for tests and ephemeral deployments

use async_trait::async_trait;

/// Trait for snapshot store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks. The
/// watch-list serializes its own flushes, so an implementation never sees
/// two overlapping `save_snapshot` calls from the same list.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved watch-list
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Saved names in order (empty if nothing was saved yet)
    /// - `Err(Error)`: Storage error
    async fn load_snapshot(&self) -> Result<Vec<String>, crate::Error>;

    /// Replace the saved watch-list with `domains`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Saved
    /// - `Err(Error)`: Storage error
    async fn save_snapshot(&self, domains: &[String]) -> Result<(), crate::Error>;
}

/// Helper trait for constructing snapshot stores from configuration
#[async_trait]
pub trait SnapshotStoreFactory: Send + Sync {
    /// Create a SnapshotStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::SnapshotStoreConfig,
    ) -> Result<Box<dyn SnapshotStore>, crate::Error>;
}
