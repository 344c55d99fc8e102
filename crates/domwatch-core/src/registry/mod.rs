//! Plugin-based registrar registry
//!
//! The registry lets registrar adapters and snapshot stores be registered
//! at runtime, so the daemon never hard-codes vendor names.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use domwatch_core::{PluginRegistry, RegistrarConfig};
//!
//! let registry = PluginRegistry::with_builtin_stores();
//! domwatch_registrar_rdap::register(&registry);
//!
//! let registrar = registry.create_registrar(&RegistrarConfig::new("rdap"))?;
//! ```
//!
//! ## Registration
//!
//! Adapter crates expose a `register()` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &PluginRegistry) {
//!     registry.register_registrar("rdap", Box::new(RdapRegistrarFactory));
//! }
//! ```

use crate::config::{RegistrarConfig, SnapshotStoreConfig};
use crate::error::{Error, Result};
use crate::snapshot::{FileSnapshotStoreFactory, MemorySnapshotStoreFactory};
use crate::traits::{Registrar, RegistrarFactory, SnapshotStore, SnapshotStoreFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry of registrar and snapshot store factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct PluginRegistry {
    /// Registered registrar factories
    registrars: RwLock<HashMap<String, Box<dyn RegistrarFactory>>>,

    /// Registered snapshot store factories
    snapshot_stores: RwLock<HashMap<String, Arc<dyn SnapshotStoreFactory>>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` snapshot stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_snapshot_store("memory", Box::new(MemorySnapshotStoreFactory));
        registry.register_snapshot_store("file", Box::new(FileSnapshotStoreFactory));
        registry
    }

    /// Register a registrar factory under `kind`
    pub fn register_registrar(&self, kind: impl Into<String>, factory: Box<dyn RegistrarFactory>) {
        let mut registrars = self.registrars.write().unwrap_or_else(PoisonError::into_inner);
        registrars.insert(kind.into(), factory);
    }

    /// Register a snapshot store factory under `name`
    pub fn register_snapshot_store(
        &self,
        name: impl Into<String>,
        factory: Box<dyn SnapshotStoreFactory>,
    ) {
        let mut stores = self
            .snapshot_stores
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        stores.insert(name.into(), Arc::from(factory));
    }

    /// Create a registrar from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Registrar>)`: Created registrar instance
    /// - `Err(Error)`: If the kind is not registered or creation fails
    pub fn create_registrar(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        let registrars = self.registrars.read().unwrap_or_else(PoisonError::into_inner);

        let factory = registrars
            .get(&config.kind)
            .ok_or_else(|| Error::config(format!("Unknown registrar kind: {}", config.kind)))?;

        factory.create(config)
    }

    /// Create every configured registrar, keeping preference order
    pub fn create_registrars(&self, configs: &[RegistrarConfig]) -> Result<Vec<Arc<dyn Registrar>>> {
        configs
            .iter()
            .map(|config| self.create_registrar(config).map(Arc::from))
            .collect()
    }

    /// Create a snapshot store from configuration
    pub async fn create_snapshot_store(
        &self,
        config: &SnapshotStoreConfig,
    ) -> Result<Box<dyn SnapshotStore>> {
        let factory = {
            let stores = self
                .snapshot_stores
                .read()
                .unwrap_or_else(PoisonError::into_inner);

            stores
                .get(config.type_name())
                .cloned()
                .ok_or_else(|| {
                    Error::config(format!("Unknown snapshot store type: {}", config.type_name()))
                })?
        };

        // The lock is released before the async create
        factory.create(config).await
    }

    /// List all registered registrar kinds
    pub fn list_registrars(&self) -> Vec<String> {
        let registrars = self.registrars.read().unwrap_or_else(PoisonError::into_inner);
        registrars.keys().cloned().collect()
    }

    /// Check if a registrar kind is registered
    pub fn has_registrar(&self, kind: &str) -> bool {
        let registrars = self.registrars.read().unwrap_or_else(PoisonError::into_inner);
        registrars.contains_key(kind)
    }

    /// Check if a snapshot store type is registered
    pub fn has_snapshot_store(&self, name: &str) -> bool {
        let stores = self
            .snapshot_stores
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;
    use async_trait::async_trait;

    struct NamedRegistrar(String);

    #[async_trait]
    impl Registrar for NamedRegistrar {
        async fn check_availability(&self, _domain: &str) -> Result<Status> {
            Ok(Status::Unavailable)
        }

        async fn register(&self, _domain: &str) -> Result<Status> {
            Ok(Status::Unavailable)
        }

        fn name(&self) -> &str {
            &self.0
        }
    }

    struct MockRegistrarFactory;

    impl RegistrarFactory for MockRegistrarFactory {
        fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
            Ok(Box::new(NamedRegistrar(config.name.clone())))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = PluginRegistry::new();

        // Initially empty
        assert!(!registry.has_registrar("mock"));

        registry.register_registrar("mock", Box::new(MockRegistrarFactory));

        assert!(registry.has_registrar("mock"));
        assert!(registry.list_registrars().contains(&"mock".to_string()));
    }

    #[test]
    fn test_create_registrars_keeps_order() {
        let registry = PluginRegistry::new();
        registry.register_registrar("mock", Box::new(MockRegistrarFactory));

        let configs = vec![
            RegistrarConfig::new("mock").with_name("second-choice"),
            RegistrarConfig::new("mock").with_name("first-choice"),
        ];
        let registrars = registry.create_registrars(&configs).unwrap();
        let names: Vec<&str> = registrars.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["second-choice", "first-choice"]);

        assert!(registry.create_registrar(&RegistrarConfig::new("missing")).is_err());
    }

    #[tokio::test]
    async fn test_builtin_stores() {
        let registry = PluginRegistry::with_builtin_stores();
        assert!(registry.has_snapshot_store("memory"));
        assert!(registry.has_snapshot_store("file"));

        let store = registry
            .create_snapshot_store(&SnapshotStoreConfig::Memory)
            .await
            .unwrap();
        assert!(store.load_snapshot().await.unwrap().is_empty());

        let custom = SnapshotStoreConfig::Custom {
            factory: "redis".to_string(),
            config: serde_json::json!({}),
        };
        assert!(registry.create_snapshot_store(&custom).await.is_err());
    }
}
