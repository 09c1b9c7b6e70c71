//! Arena settings with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Optional TOML file passed by the host
//! 3. Environment variables: `RSMODEL_*` prefix

use std::path::Path;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::domain::ModelError;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "RSMODEL";

/// Tuning knobs for a `ModelArena`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Nodes to preallocate
    pub node_capacity: usize,
    /// Cross-references to preallocate
    pub reference_capacity: usize,
    /// Reject attachments that would make a node its own ancestor
    pub detect_cycles: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            node_capacity: 64,
            reference_capacity: 16,
            detect_cycles: true,
        }
    }
}

/// Raw settings for intermediate parsing (None → not specified, keep base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    node_capacity: Option<usize>,
    reference_capacity: Option<usize>,
    detect_cycles: Option<bool>,
}

fn config_err(e: ConfigError) -> ModelError {
    ModelError::Config {
        message: e.to_string(),
    }
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ModelError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins if it specifies a value, otherwise keep self.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            node_capacity: overlay.node_capacity.unwrap_or(self.node_capacity),
            reference_capacity: overlay
                .reference_capacity
                .unwrap_or(self.reference_capacity),
            detect_cycles: overlay.detect_cycles.unwrap_or(self.detect_cycles),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// A missing file is skipped; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ModelError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`Settings::load`] with a custom environment prefix.
    pub fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, ModelError> {
        let mut current = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current, prefix)
    }

    /// Apply `<PREFIX>_*` environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, prefix: &str) -> Result<Self, ModelError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<usize>("node_capacity") {
            settings.node_capacity = val;
        }
        if let Ok(val) = config.get::<usize>("reference_capacity") {
            settings.reference_capacity = val;
        }
        if let Ok(val) = config.get_bool("detect_cycles") {
            settings.detect_cycles = val;
        }

        Ok(settings)
    }

    /// Serialize to TOML, e.g. to write a starter config file.
    pub fn to_toml(&self) -> Result<String, ModelError> {
        toml::to_string_pretty(self).map_err(|e| ModelError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
