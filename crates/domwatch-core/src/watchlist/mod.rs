//! Watch-list store
//!
//! The ordered set of domain names under monitoring. It is the only state
//! shared between the watch loop and the control-plane sessions.
//!
//! ## Locking
//!
//! ```text
//!  add/remove ──► write lock ──► mutate ──► release
//!                                              │
//!                                              ▼
//!                          flush section ──► read lock (copy) ──► save_snapshot
//! ```
//!
//! A mutation drops its write lock before entering the flush section, so no
//! operation ever holds both. The flush re-reads the sequence inside its own
//! section, which makes the last flush to run persist the latest state.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::SnapshotStore;

/// Longest domain name the watch-list accepts
pub const MAX_DOMAIN_LEN: usize = 255;

/// Check that `name` is a bare token the watch-list can hold
///
/// The name must be non-empty, at most [`MAX_DOMAIN_LEN`] bytes, and free
/// of whitespace and control characters. DNS syntax is left to registrars.
pub fn validate_domain(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input("Domain name cannot be empty"));
    }

    if name.len() > MAX_DOMAIN_LEN {
        return Err(Error::invalid_input(format!(
            "Domain name too long: {} chars (max {})",
            name.len(),
            MAX_DOMAIN_LEN
        )));
    }

    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::invalid_input(format!(
            "Domain name must be a single token: '{}'",
            name.escape_debug()
        )));
    }

    Ok(())
}

/// Concurrency-safe ordered set of watched domain names
///
/// # Example
///
/// ```rust
/// use domwatch_core::WatchList;
///
/// #[tokio::main]
/// async fn main() -> domwatch_core::Result<()> {
///     let list = WatchList::new();
///     list.add("example.com").await?;
///     list.add("example.org").await?;
///     list.add("example.com").await?;
///
///     assert_eq!(list.list().await, vec!["example.com", "example.org"]);
///     Ok(())
/// }
/// ```
pub struct WatchList {
    domains: RwLock<Vec<String>>,
    store: Option<Arc<dyn SnapshotStore>>,
    flush_section: Mutex<()>,
}

impl WatchList {
    /// Create an empty, memory-only watch-list
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), None)
    }

    /// Create a memory-only watch-list pre-populated with `domains`
    ///
    /// Invalid names are skipped and duplicates keep their first position.
    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_parts(sanitize(domains), None)
    }

    /// Create an empty watch-list that flushes to `store`
    pub fn with_store(store: Arc<dyn SnapshotStore>) -> Self {
        Self::from_parts(Vec::new(), Some(store))
    }

    /// Create a watch-list from the last snapshot in `store`
    ///
    /// An unreadable store is logged and yields an empty list; the store is
    /// still used for later flushes.
    pub async fn restore(store: Arc<dyn SnapshotStore>) -> Self {
        let domains = match store.load_snapshot().await {
            Ok(domains) => {
                let domains = sanitize(domains);
                info!("Restored {} watched domain(s) from snapshot", domains.len());
                domains
            }
            Err(e) => {
                warn!("Failed to load watch-list snapshot, starting empty: {}", e);
                Vec::new()
            }
        };

        Self::from_parts(domains, Some(store))
    }

    fn from_parts(domains: Vec<String>, store: Option<Arc<dyn SnapshotStore>>) -> Self {
        Self {
            domains: RwLock::new(domains),
            store,
            flush_section: Mutex::new(()),
        }
    }

    /// Append `name` unless it is already watched
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The name was appended and a flush ran
    /// - `Ok(false)`: The name was already present (no-op)
    /// - `Err(Error::InvalidInput)`: The name failed [`validate_domain`]
    pub async fn add(&self, name: &str) -> Result<bool> {
        validate_domain(name)?;

        let added = {
            let mut domains = self.domains.write().await;
            if domains.iter().any(|d| d == name) {
                false
            } else {
                domains.push(name.to_string());
                true
            }
        };

        if added {
            info!("Added domain \"{}\"", name);
            self.flush().await;
        } else {
            debug!("Domain \"{}\" is already watched", name);
        }

        Ok(added)
    }

    /// Remove `name` if it is watched
    ///
    /// Returns whether anything was removed. The order of the remaining
    /// names is preserved.
    pub async fn remove(&self, name: &str) -> bool {
        let removed = {
            let mut domains = self.domains.write().await;
            match domains.iter().position(|d| d == name) {
                Some(index) => {
                    domains.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            info!("Removed domain \"{}\"", name);
            self.flush().await;
        } else {
            debug!("Domain \"{}\" was not watched", name);
        }

        removed
    }

    /// A consistent copy of the current sequence
    pub async fn list(&self) -> Vec<String> {
        self.domains.read().await.clone()
    }

    /// Whether `name` is watched
    pub async fn contains(&self, name: &str) -> bool {
        self.domains.read().await.iter().any(|d| d == name)
    }

    /// Number of watched names
    pub async fn len(&self) -> usize {
        self.domains.read().await.len()
    }

    /// Whether nothing is watched
    pub async fn is_empty(&self) -> bool {
        self.domains.read().await.is_empty()
    }

    async fn flush(&self) {
        let Some(store) = &self.store else {
            return;
        };

        let _section = self.flush_section.lock().await;
        let snapshot = self.list().await;

        match store.save_snapshot(&snapshot).await {
            Ok(()) => debug!("Persisted watch-list ({} domains)", snapshot.len()),
            Err(e) => warn!(
                "Failed to persist watch-list, continuing in memory only: {}",
                e
            ),
        }
    }
}

impl Default for WatchList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WatchList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchList")
            .field("persistent", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

fn sanitize<I, S>(domains: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for name in domains {
        let name = name.into();
        if let Err(e) = validate_domain(&name) {
            warn!("Skipping watch-list entry: {}", e);
            continue;
        }
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
