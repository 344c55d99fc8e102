//! Core traits for the domwatch system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Registrar`]: Check availability of and register domain names at one backend
//! - [`SnapshotStore`]: Best-effort persistence of the watch-list

pub mod registrar;
pub mod snapshot_store;

pub use registrar::{Registrar, RegistrarFactory};
pub use snapshot_store::{SnapshotStore, SnapshotStoreFactory};
