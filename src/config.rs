//! Centralized configuration for the transfer core.
//!
//! Tunables that shape descriptor creation and download behavior live
//! here so they can be reviewed in a single place. Engine-side settings
//! (listen ports, rate limits) belong to the embedding application and
//! its transport engine, not to this crate.

use serde::Deserialize;
use std::path::Path;

/// Prefix for temporary serialized descriptor files, created next to
/// the source file being seeded.
pub const DESCRIPTOR_TEMP_PREFIX: &str = "seed_";

/// Suffix for temporary serialized descriptor files.
pub const DESCRIPTOR_TEMP_SUFFIX: &str = ".descriptor";

/// Configuration for a [`TransferManager`](crate::manager::TransferManager).
///
/// All fields have working defaults; a TOML file can override any subset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Creator label stamped into every generated descriptor.
    pub creator: String,

    /// Mark generated descriptors private (no public discovery network).
    /// One-to-one transfers keep this on.
    pub private_descriptors: bool,

    /// Request deterministic front-to-back piece order for downloads so
    /// partial progress is meaningful to an observer.
    pub sequential_download: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            creator: "peerdrop".to_string(),
            private_descriptors: true,
            sequential_download: true,
        }
    }
}

impl ManagerConfig {
    /// Load configuration from a TOML file, if it exists.
    ///
    /// Missing file or unparsable content falls back to defaults;
    /// partial files override only the keys they name.
    pub fn from_file(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<ManagerConfig>(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    event = "config_parse_failure",
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config file, using defaults"
                );
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(
                    event = "config_read_failure",
                    path = %path.display(),
                    error = %e,
                    "Failed to read config file, using defaults"
                );
                Self::default()
            }
        }
    }
}
