// # File Snapshot Store
//
// File-based implementation of SnapshotStore with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good snapshot
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "saved_at": "2025-01-09T12:00:00Z",
//   "domains": ["example.com", "example.org"]
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::SnapshotStoreConfig;
use crate::traits::snapshot_store::{SnapshotStore, SnapshotStoreFactory};

/// Snapshot file format version
const SNAPSHOT_FILE_VERSION: &str = "1.0";

/// File-based snapshot store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use domwatch_core::snapshot::FileSnapshotStore;
/// use domwatch_core::traits::SnapshotStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSnapshotStore::new("/var/lib/domwatch/watchlist.json").await?;
///
///     store.save_snapshot(&["example.com".to_string()]).await?;
///     assert_eq!(store.load_snapshot().await?, vec!["example.com"]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// Serializable snapshot file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SnapshotFileFormat {
    version: String,
    saved_at: chrono::DateTime<chrono::Utc>,
    domains: Vec<String>,
}

impl FileSnapshotStore {
    /// Create a file snapshot store, creating parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create snapshot directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the main snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a snapshot file, treating absence as an empty list
    async fn load_file(path: &Path) -> Result<Vec<String>, Error> {
        if !path.exists() {
            tracing::debug!("Snapshot file does not exist: {}", path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::snapshot(format!(
                "Failed to read snapshot file {}: {}",
                path.display(),
                e
            ))
        })?;

        // Parse errors stay Error::Json so the caller can tell corruption apart
        let snapshot: SnapshotFileFormat = serde_json::from_str(&content)?;

        if snapshot.version != SNAPSHOT_FILE_VERSION {
            tracing::warn!(
                "Snapshot file version mismatch: expected {}, got {}. Attempting to load anyway.",
                SNAPSHOT_FILE_VERSION,
                snapshot.version
            );
        }

        Ok(snapshot.domains)
    }

    /// Load with fallback to the backup file when the main file is corrupt
    async fn load_with_recovery(&self) -> Result<Vec<String>, Error> {
        match Self::load_file(&self.path).await {
            Ok(domains) => {
                tracing::debug!("Loaded snapshot: {} domains", domains.len());
                Ok(domains)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Snapshot file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(&self.path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty watch-list.");
                    return Ok(Vec::new());
                }

                match Self::load_file(&backup_path).await {
                    Ok(domains) => {
                        tracing::info!("Recovered snapshot from backup: {} domains", domains.len());
                        if let Err(restore_err) = fs::copy(&backup_path, &self.path).await {
                            tracing::error!(
                                "Failed to restore snapshot file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(domains)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also corrupted: {}. Starting with empty watch-list.",
                            backup_err
                        );
                        Ok(Vec::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Write the snapshot atomically, keeping the previous file as backup
    async fn write_file(&self, domains: &[String]) -> Result<(), Error> {
        let snapshot = SnapshotFileFormat {
            version: SNAPSHOT_FILE_VERSION.to_string(),
            saved_at: chrono::Utc::now(),
            domains: domains.to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| Error::snapshot(format!("Failed to serialize snapshot: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::snapshot(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::snapshot(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::snapshot(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::snapshot(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Snapshot written to file: {}", self.path.display());
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load_snapshot(&self) -> Result<Vec<String>, Error> {
        self.load_with_recovery().await
    }

    async fn save_snapshot(&self, domains: &[String]) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        self.write_file(domains).await
    }
}

/// Factory for the `file` snapshot store type
#[derive(Debug, Default)]
pub struct FileSnapshotStoreFactory;

#[async_trait]
impl SnapshotStoreFactory for FileSnapshotStoreFactory {
    async fn create(&self, config: &SnapshotStoreConfig) -> Result<Box<dyn SnapshotStore>, Error> {
        match config {
            SnapshotStoreConfig::File { path } => Ok(Box::new(FileSnapshotStore::new(path).await?)),
            other => Err(Error::config(format!(
                "File snapshot factory cannot build a '{}' store",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchlist.json");

        let store = FileSnapshotStore::new(&path).await.unwrap();

        // Absent file loads as empty
        assert!(store.load_snapshot().await.unwrap().is_empty());

        store.save_snapshot(&names(&["b.com", "a.com"])).await.unwrap();
        assert!(path.exists());

        // Load new instance and verify persistence (order preserved)
        let store2 = FileSnapshotStore::new(&path).await.unwrap();
        assert_eq!(store2.load_snapshot().await.unwrap(), vec!["b.com", "a.com"]);
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("watchlist.json");

        let store = FileSnapshotStore::new(&path).await.unwrap();
        store.save_snapshot(&names(&["a.com"])).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchlist.json");

        let store = FileSnapshotStore::new(&path).await.unwrap();
        store.save_snapshot(&names(&["first.com"])).await.unwrap();
        // Second write moves the first into the backup
        store.save_snapshot(&names(&["first.com", "second.com"])).await.unwrap();

        let backup_path = FileSnapshotStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let recovered = store.load_snapshot().await.unwrap();
        assert_eq!(
            recovered,
            vec!["first.com"],
            "Backup should contain previous snapshot, not latest"
        );

        // Main file was restored from the backup
        let reloaded = FileSnapshotStore::load_file(&path).await.unwrap();
        assert_eq!(reloaded, vec!["first.com"]);
    }

    #[tokio::test]
    async fn test_corrupt_without_backup_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchlist.json");
        fs::write(&path, b"{ not json").await.unwrap();

        let store = FileSnapshotStore::new(&path).await.unwrap();
        assert!(store.load_snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_factory_rejects_other_types() {
        let factory = FileSnapshotStoreFactory;
        assert!(factory.create(&SnapshotStoreConfig::Memory).await.is_err());
    }
}
