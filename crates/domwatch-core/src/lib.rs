// # domwatch-core
//
// Core library for the domwatch domain availability watcher.
//
// ## Architecture Overview
//
// This library provides everything except vendor bindings:
// - **Registrar**: Trait for checking availability and registering a domain at one backend
// - **SnapshotStore**: Trait for best-effort persistence of the watch-list
// - **orchestrator**: Ordered check/register passes across many registrars
// - **WatchList**: Concurrency-safe ordered set of watched domain names
// - **DomainWatcher**: Periodic loop that checks every watched name and registers on availability
// - **ControlServer**: Line-oriented, token-authenticated control plane that edits the watch-list
// - **PluginRegistry**: Factory tables for registrars and snapshot stores
//
// ## Design Principles
//
// 1. **Ordered Preference**: Registrar order is operator preference; passes never reorder it
// 2. **Degrade, Don't Die**: Backend and persistence failures are logged and recovered locally
// 3. **Single Lock**: The watch-list sequence is the only shared mutable state
// 4. **Deterministic Shutdown**: One single-fire signal reaches every blocking wait
// 5. **Library-First**: The daemon is a thin wiring layer over this crate

pub mod traits;
pub mod status;
pub mod orchestrator;
pub mod watchlist;
pub mod watcher;
pub mod server;
pub mod shutdown;
pub mod registry;
pub mod config;
pub mod error;
pub mod snapshot;

// Re-export core types for convenience
pub use traits::{Registrar, SnapshotStore};
pub use status::{CheckResult, Status};
pub use orchestrator::{check_pass, register_pass};
pub use watchlist::WatchList;
pub use watcher::{DomainWatcher, WatchEvent};
pub use server::ControlServer;
pub use shutdown::Shutdown;
pub use registry::PluginRegistry;
pub use config::{DomwatchConfig, RegistrarConfig, ServerConfig, SnapshotStoreConfig, WatcherConfig};
pub use error::{AggregatedError, BackendError, Error, Result};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore};
