//! Tool configuration
//!
//! Every field has a default, so an absent config file and an empty JSON
//! object are equivalent. Command-line flags override file values. The
//! resulting value is passed into each component's constructor; nothing
//! reads configuration from process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::check::BucketFilter;
use crate::observability::Logger;

/// Default name of the persisted size index inside a channel directory
pub const DEFAULT_SIZE_INDEX_NAME: &str = "sizeinfo";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration shared by every command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Emit per-file and per-record TRACE lines
    #[serde(default)]
    pub verbose: bool,

    /// Restrict channel scans to matching bucket ids
    #[serde(default)]
    pub bucket_filter: Option<BucketFilter>,

    /// File name of the persisted size index inside a channel directory
    #[serde(default = "default_size_index_name")]
    pub size_index_name: String,

    /// Files between CHECK_PROGRESS lines during a channel check
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_size_index_name() -> String {
    DEFAULT_SIZE_INDEX_NAME.to_string()
}

fn default_progress_interval() -> u64 {
    1000
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            bucket_filter: None,
            size_index_name: default_size_index_name(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl ToolConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ToolConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate field values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_index_name.is_empty() {
            return Err(ConfigError::Invalid(
                "size_index_name must not be empty".to_string(),
            ));
        }
        if self.size_index_name.contains('/') || self.size_index_name.contains('\\') {
            return Err(ConfigError::Invalid(format!(
                "size_index_name '{}' must be a plain file name",
                self.size_index_name
            )));
        }
        if self.progress_interval == 0 {
            return Err(ConfigError::Invalid(
                "progress_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Logger honouring the configured verbosity
    pub fn logger(&self) -> Logger {
        Logger::new(self.verbose)
    }

    /// Path of the persisted size index for a channel
    pub fn size_index_path(&self, channel_dir: &Path) -> PathBuf {
        channel_dir.join(&self.size_index_name)
    }
}
