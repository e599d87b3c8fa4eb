//! Configuration file support for asset-ref-index.
//!
//! Provides YAML-based configuration through `refindex.config.yml` files,
//! including data structures, file loading, and validation.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::application::dto::IndexOptions;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "refindex.config.yml";

/// Snapshot location used when neither the CLI nor the config file sets one
pub const DEFAULT_SNAPSHOT_PATH: &str = ".refindex/index.json";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub snapshot_path: Option<PathBuf>,
    pub max_concurrency: Option<usize>,
    pub batch_size: Option<usize>,
    pub max_rebuild_passes: Option<usize>,
    pub rebuild_on_first_query: Option<bool>,
    pub log_level: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

impl ConfigFile {
    /// Overlays the values set in the file onto `options`
    pub fn apply_to(&self, mut options: IndexOptions) -> IndexOptions {
        if let Some(batch_size) = self.batch_size {
            options.batch_size = batch_size;
        }
        if let Some(max_concurrency) = self.max_concurrency {
            options.max_concurrency = max_concurrency;
        }
        if let Some(passes) = self.max_rebuild_passes {
            options.max_rebuild_passes = passes;
        }
        if let Some(rebuild) = self.rebuild_on_first_query {
            options.rebuild_on_first_query = rebuild;
        }
        options
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    let positive = [
        ("max_concurrency", config.max_concurrency),
        ("batch_size", config.batch_size),
        ("max_rebuild_passes", config.max_rebuild_passes),
    ];
    for (field, value) in positive {
        if value == Some(0) {
            bail!(
                "Invalid config: {} must be greater than 0.\n\n\
                 💡 Hint: Remove the field to use the default value.",
                field
            );
        }
    }

    if let Some(ref path) = config.snapshot_path {
        if path.as_os_str().is_empty() {
            bail!(
                "Invalid config: snapshot_path must not be empty.\n\n\
                 💡 Hint: Use a file path such as \"{}\".",
                DEFAULT_SNAPSHOT_PATH
            );
        }
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        warn!(field = %key, "unknown config field will be ignored");
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}
