//! Contract Test: Watch-List Persistence
//!
//! Constraints verified:
//! - Every effective mutation is flushed with the full current list
//! - No-op mutations do not flush
//! - Concurrent mutations never deadlock and the last flush is current
//! - A file snapshot survives a restart

mod common;

use std::sync::Arc;

use common::*;
use domwatch_core::snapshot::FileSnapshotStore;
use domwatch_core::{SnapshotStore, WatchList};
use tempfile::TempDir;

#[tokio::test]
async fn effective_mutations_flush_the_whole_list() {
    let store = RecordingSnapshotStore::with_initial(&[]);
    let list = WatchList::with_store(store.clone());

    list.add("a.com").await.unwrap();
    list.add("b.com").await.unwrap();
    list.add("a.com").await.unwrap();
    list.remove("zzz.com").await;
    list.remove("a.com").await;

    assert_eq!(
        store.saves(),
        vec![
            vec!["a.com".to_string()],
            vec!["a.com".to_string(), "b.com".to_string()],
            vec!["b.com".to_string()],
        ]
    );
}

#[tokio::test]
async fn restore_drops_duplicates_and_invalid_entries() {
    let store = RecordingSnapshotStore::with_initial(&["a.com", "bad name", "b.com", "a.com", ""]);

    let list = WatchList::restore(store.clone()).await;

    assert_eq!(list.list().await, vec!["a.com", "b.com"]);
    assert!(store.saves().is_empty(), "restoring does not write back");
}

#[tokio::test]
async fn concurrent_mutations_end_with_a_current_snapshot() {
    let store = RecordingSnapshotStore::with_initial(&[]);
    let list = Arc::new(WatchList::with_store(store.clone()));

    let mut tasks = Vec::new();
    for i in 0..32 {
        let list = list.clone();
        tasks.push(tokio::spawn(async move {
            let name = format!("d{}.com", i);
            list.add(&name).await.unwrap();
            if i % 2 == 0 {
                list.remove(&name).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let current = list.list().await;
    assert_eq!(current.len(), 16);
    assert_eq!(store.last_save(), Some(current));
}

#[tokio::test]
async fn file_snapshot_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("watchlist.json");

    {
        let store = Arc::new(FileSnapshotStore::new(&path).await.unwrap());
        let list = WatchList::restore(store).await;
        list.add("a.com").await.unwrap();
        list.add("b.com").await.unwrap();
        list.remove("a.com").await;
        list.add("c.com").await.unwrap();
    }

    let store = Arc::new(FileSnapshotStore::new(&path).await.unwrap());
    assert_eq!(store.load_snapshot().await.unwrap(), vec!["b.com", "c.com"]);

    let list = WatchList::restore(store).await;
    assert_eq!(list.list().await, vec!["b.com", "c.com"]);
}
