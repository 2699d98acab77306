//! Configuration loading for the terragen CLI

use anyhow::{Context, Result};
use std::path::PathBuf;
use terragen_core::BuildConfig;

const DEFAULT_CONFIG_FILE: &str = "terragen.toml";

/// Load configuration from an explicit path, `./terragen.toml`, or defaults
pub fn load_config(path: Option<PathBuf>) -> Result<BuildConfig> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(BuildConfig::from_toml(&content)?);
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        let content = std::fs::read_to_string(&default_path)
            .with_context(|| format!("failed to read {}", default_path.display()))?;
        Ok(BuildConfig::from_toml(&content)?)
    } else {
        Ok(BuildConfig::default())
    }
}
