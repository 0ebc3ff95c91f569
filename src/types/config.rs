//! Configuration structures.
//!
//! Configuration is loaded from config files or assembled in code by the
//! embedding process.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::Result;

/// Global lease-core configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Resource hierarchy acquisition.
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Resource hierarchy acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Fail construction when the resource tree cannot be fetched, instead
    /// of degrading to flat validation.
    pub require_hierarchy: bool,

    /// Deadline handed to the tree source for the construction-time fetch.
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            require_hierarchy: false,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}
