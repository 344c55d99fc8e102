//! Configuration types for the domwatch system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Main domwatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomwatchConfig {
    /// Registrars in preference order
    #[serde(default)]
    pub registrars: Vec<RegistrarConfig>,

    /// Snapshot store configuration
    #[serde(default)]
    pub snapshot_store: SnapshotStoreConfig,

    /// Control-plane server settings
    pub server: ServerConfig,

    /// Watch loop settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Names seeded into the watch-list at startup
    #[serde(default)]
    pub domains: Vec<String>,
}

impl DomwatchConfig {
    /// Create a configuration with defaults and the given control-plane secret
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            registrars: Vec::new(),
            snapshot_store: SnapshotStoreConfig::default(),
            server: ServerConfig::new(auth_token),
            watcher: WatcherConfig::default(),
            domains: Vec::new(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.server.validate()?;
        self.watcher.validate()?;
        self.snapshot_store.validate()?;

        let mut names = HashSet::new();
        for registrar in &self.registrars {
            registrar.validate()?;
            if !names.insert(registrar.name.as_str()) {
                return Err(crate::Error::config(format!(
                    "Duplicate registrar name: {}",
                    registrar.name
                )));
            }
        }

        for domain in &self.domains {
            crate::watchlist::validate_domain(domain)
                .map_err(|e| crate::Error::config(format!("Invalid seed domain: {}", e)))?;
        }

        Ok(())
    }
}

/// Registrar configuration
///
/// `kind` selects the factory in the [`crate::PluginRegistry`]; `name`
/// identifies this instance in logs, results and errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Factory name (e.g., "rdap")
    pub kind: String,

    /// Instance name
    pub name: String,

    /// Factory-specific settings
    #[serde(default)]
    pub settings: serde_json::Value,
}

impl RegistrarConfig {
    /// Create a registrar configuration named after its kind
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            name: kind.clone(),
            kind,
            settings: serde_json::Value::Null,
        }
    }

    /// Set the instance name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set one factory-specific setting
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if !self.settings.is_object() {
            self.settings = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(map) = self.settings.as_object_mut() {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Read a string setting
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(|v| v.as_str())
    }

    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.kind.is_empty() {
            return Err(crate::Error::config("Registrar kind cannot be empty"));
        }
        if self.name.is_empty() {
            return Err(crate::Error::config("Registrar name cannot be empty"));
        }
        Ok(())
    }
}

/// Snapshot store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotStoreConfig {
    /// File-based snapshot store
    File {
        /// Path to the snapshot file
        path: String,
    },

    /// In-memory snapshot store (not persistent)
    #[default]
    Memory,

    /// Custom snapshot store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl SnapshotStoreConfig {
    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            SnapshotStoreConfig::File { .. } => "file",
            SnapshotStoreConfig::Memory => "memory",
            SnapshotStoreConfig::Custom { factory, .. } => factory,
        }
    }

    /// Validate the snapshot store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SnapshotStoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Snapshot file path cannot be empty"))
            }
            SnapshotStoreConfig::Custom { factory, .. } if factory.is_empty() => Err(
                crate::Error::config("Custom snapshot store factory cannot be empty"),
            ),
            _ => Ok(()),
        }
    }
}

/// Control-plane server configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Shared secret expected by `AUTH`
    pub auth_token: String,
}

impl ServerConfig {
    /// Create a server configuration on the default address
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth_token: auth_token.into(),
        }
    }

    /// Set the listen address
    pub fn with_bind_addr(mut self, bind_addr: impl Into<String>) -> Self {
        self.bind_addr = bind_addr.into();
        self
    }

    /// Validate the server configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.bind_addr.is_empty() {
            return Err(crate::Error::config("Server bind address cannot be empty"));
        }
        if self.auth_token.is_empty() {
            return Err(crate::Error::config("Control-plane auth token cannot be empty"));
        }
        if self.auth_token.chars().any(char::is_whitespace) {
            return Err(crate::Error::config(
                "Control-plane auth token cannot contain whitespace",
            ));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the auth token
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("auth_token", &"<REDACTED>")
            .finish()
    }
}

/// Watch loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Pause between two passes over the watch-list (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of the watch event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl WatcherConfig {
    /// The pause between passes
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the watcher configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Watch interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_interval_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    1000
}
