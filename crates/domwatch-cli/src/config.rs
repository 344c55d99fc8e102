//! Saved client settings
//!
//! Stored as JSON at `$HOME/.domwatch-cli.json`. Every field has a default,
//! so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = ".domwatch-cli.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub host: String,
    pub port: u16,
    pub token: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8081,
            token: String::new(),
        }
    }
}

impl CliConfig {
    /// Default location under the user's home directory
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(home.join(CONFIG_FILE))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Update one setting by name (`host`, `port` or `token`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key.to_ascii_lowercase().as_str() {
            "host" => self.host = value.to_string(),
            "port" => {
                self.port = value
                    .parse()
                    .with_context(|| format!("invalid port '{}'", value))?
            }
            "token" => self.token = value.to_string(),
            other => bail!("unknown setting '{}' (expected host, port or token)", other),
        }
        Ok(())
    }
}
