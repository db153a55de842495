//! `docforge-config` — runtime configuration management.
//!
//! Provides:
//! - Typed config schema (OCR backend, LLM agent, gateway, logging)
//! - YAML loading from the config directory
//! - `${ENV_VAR}` substitution and environment overrides
//! - Config redaction for safe logging
//! - Default value application and validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod overrides;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config};
pub use overrides::{apply_env_overrides, apply_env_overrides_with};
pub use redact::{redact, redacted_snapshot};
pub use schema::{DocForgeConfig, GatewayConfig, LlmConfig, LoggingConfig, OcrConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime. Validation
/// errors are fatal; warnings are logged.
pub async fn load_and_prepare(path: &Path) -> Result<DocForgeConfig> {
    load_and_prepare_with(path, &std::env::vars().collect()).await
}

/// `load_and_prepare` against an explicit environment map.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<DocForgeConfig> {
    let raw_config = load_config(path).await?;

    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: DocForgeConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides_with(config, env)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if let Some(first) = report.errors.first() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        match report.errors.len() {
            1 => bail!("{first}"),
            n => bail!("{first} (and {} more)", n - 1),
        }
    }

    tracing::debug!(config = %redacted_snapshot(&config), "Effective config");
    Ok(config)
}
