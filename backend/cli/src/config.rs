//! Runtime configuration for the binary: `.env`, config file, env overrides.

use std::path::PathBuf;

use anyhow::Result;
use docforge_config::{
    config_dir, config_file_path, load_and_prepare, redacted_snapshot, validate, DocForgeConfig,
};

/// Load `.env` (if present) and then the prepared config.
///
/// `path` overrides the default `~/.docforge/config.yaml` location.
pub async fn load(path: Option<PathBuf>) -> Result<DocForgeConfig> {
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();
    let path = match path {
        Some(path) => path,
        None => config_file_path(&config_dir()),
    };
    load_and_prepare(&path).await
}

/// Re-emit config warnings and the redacted effective config once a subscriber is
/// installed; loading runs before logging.
pub fn log_loaded_config(config: &DocForgeConfig) {
    for warning in validate(config).warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    tracing::debug!(config = %redacted_snapshot(config), "Effective config");
}
