//! `[hot]` configuration.
//!
//! # Example
//!
//! ```toml
//! [hot]
//! watch = true            # Start watching a module when it is imported
//! skip_empty = true       # Ignore change events while the file is empty
//! skip_unchanged = true   # Ignore change events when the content hash is unchanged
//! poll_interval_ms = 0    # 0 = native notify backend, >0 = polling interval
//! ```
//!
//! The section header is optional: a file holding only the bare keys is
//! accepted too.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),
}

/// Hot import settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HotConfig {
    /// Start a watcher when a module is imported.
    pub watch: bool,

    /// Editors truncate before writing; a change event seen while the file is
    /// empty is not a reload trigger.
    pub skip_empty: bool,

    /// Skip the reload when the file hashes the same as the last good load.
    pub skip_unchanged: bool,

    /// Use a polling watcher with this interval instead of the native backend.
    /// `0` selects the native backend.
    pub poll_interval_ms: u64,
}

impl Default for HotConfig {
    fn default() -> Self {
        Self {
            watch: true,
            skip_empty: true,
            skip_unchanged: true,
            poll_interval_ms: 0,
        }
    }
}

impl FromStr for HotConfig {
    type Err = ConfigError;

    /// Parse configuration from TOML content.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let mut table: toml::Table = toml::from_str(content)?;
        let config: Self = match table.remove("hot") {
            Some(section) => section.try_into()?,
            None => toml::Value::Table(table).try_into()?,
        };
        Ok(config)
    }
}

impl HotConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        content.parse()
    }

    /// Polling interval, `None` for the native backend.
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_ms > 0).then(|| Duration::from_millis(self.poll_interval_ms))
    }
}
