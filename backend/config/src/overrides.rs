//! Environment variable overrides applied on top of the config file.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::str::FromStr;

use crate::schema::DocForgeConfig;

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: DocForgeConfig) -> Result<DocForgeConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from the given variable map. Empty values are ignored.
pub fn apply_env_overrides_with(
    mut config: DocForgeConfig,
    env: &HashMap<String, String>,
) -> Result<DocForgeConfig> {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(v) = get("OCR_BACKEND") {
        config.ocr.backend = Some(v.to_string());
    }
    if let Some(v) = get("OCR_SPACE_API_KEY") {
        config.ocr.api_key = Some(v.to_string());
    }
    if let Some(v) = get("OCR_TIMEOUT_SECS") {
        config.ocr.timeout_secs = Some(parse_var("OCR_TIMEOUT_SECS", v)?);
    }
    if let Some(v) = get("TESSERACT_BIN") {
        config.ocr.tesseract_bin = Some(v.to_string());
    }
    if let Some(v) = get("ANTHROPIC_API_KEY") {
        config.llm.api_key = Some(v.to_string());
    }
    if let Some(v) = get("DOCFORGE_LLM_PROVIDER") {
        config.llm.provider = Some(v.to_string());
    }
    if let Some(v) = get("DOCFORGE_MODEL") {
        config.llm.model = Some(v.to_string());
    }
    if let Some(v) = get("DOCFORGE_TEMPERATURE") {
        config.llm.temperature = Some(parse_var("DOCFORGE_TEMPERATURE", v)?);
    }
    if let Some(v) = get("DOCFORGE_MAX_TOKENS") {
        config.llm.max_tokens = Some(parse_var("DOCFORGE_MAX_TOKENS", v)?);
    }
    if let Some(v) = get("DOCFORGE_MAX_ITERATIONS") {
        config.llm.max_iterations = Some(parse_var("DOCFORGE_MAX_ITERATIONS", v)?);
    }
    if let Some(v) = get("DOCFORGE_BIND") {
        config.gateway.bind = Some(v.to_string());
    }
    if let Some(v) = get("DOCFORGE_PORT") {
        config.gateway.port = Some(parse_var("DOCFORGE_PORT", v)?);
    }
    if let Some(v) = get("DOCFORGE_UPLOAD_DIR") {
        config.gateway.upload_dir = Some(v.into());
    }

    Ok(config)
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("Invalid value for {name}: {raw:?}"))
}
