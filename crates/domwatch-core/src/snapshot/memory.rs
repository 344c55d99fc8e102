// # Memory Snapshot Store
//
// In-memory implementation of SnapshotStore.
//
// ## Purpose
//
// Keeps the last saved watch-list for the lifetime of the process only.
// Useful for tests and for deployments where the list is re-seeded from
// configuration on every start.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::config::SnapshotStoreConfig;
use crate::traits::snapshot_store::{SnapshotStore, SnapshotStoreFactory};

/// In-memory snapshot store implementation
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<RwLock<Vec<String>>>,
    saves: Arc<AtomicUsize>,
}

impl MemorySnapshotStore {
    /// Create a new empty memory snapshot store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a snapshot
    pub fn with_domains(domains: Vec<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(domains)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of completed `save_snapshot` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load_snapshot(&self) -> Result<Vec<String>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save_snapshot(&self, domains: &[String]) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        *guard = domains.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory for the `memory` snapshot store type
#[derive(Debug, Default)]
pub struct MemorySnapshotStoreFactory;

#[async_trait]
impl SnapshotStoreFactory for MemorySnapshotStoreFactory {
    async fn create(&self, _config: &SnapshotStoreConfig) -> Result<Box<dyn SnapshotStore>, Error> {
        Ok(Box::new(MemorySnapshotStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemorySnapshotStore::new();

        // Initially empty
        assert!(store.load_snapshot().await.unwrap().is_empty());

        let domains = vec!["a.com".to_string(), "b.com".to_string()];
        store.save_snapshot(&domains).await.unwrap();

        assert_eq!(store.load_snapshot().await.unwrap(), domains);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemorySnapshotStore::new();
        let clone = store.clone();

        clone.save_snapshot(&["x.com".to_string()]).await.unwrap();
        assert_eq!(store.load_snapshot().await.unwrap(), vec!["x.com"]);
        assert_eq!(store.save_count(), 1);
    }
}
