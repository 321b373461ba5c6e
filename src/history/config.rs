// History configuration - loaded from RON or JSON

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum number of groups to keep in the undo stack
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Default ceiling for reentrant writes
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for a [`History`](crate::history::History)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of committed groups kept in the undo stack.
    /// The oldest group is dropped when the limit is reached.
    pub max_history: usize,

    /// Maximum nesting of writes and batches before a write fails with
    /// `ReentrancyLimit`
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl HistoryConfig {
    /// Parse a configuration from a RON string
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()
    }

    /// Parse a configuration from a JSON string
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()
    }

    /// Load a configuration file. `.json` files are read as JSON, anything
    /// else as RON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_ron_str(&content),
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_history == 0 {
            return Err(ConfigError::Invalid("max_history must be > 0".into()));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be > 0".into()));
        }
        Ok(self)
    }
}
