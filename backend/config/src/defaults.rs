//! Config defaults: applies default values to parsed config.

use crate::schema::DocForgeConfig;

pub const DEFAULT_OCR_BACKEND: &str = "tesseract";
pub const DEFAULT_OCR_SPACE_ENDPOINT: &str = "https://api.ocr.space/parse/image";
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
/// Remote OCR requests never wait longer than this unless configured.
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TESSERACT_BIN: &str = "tesseract";

pub const DEFAULT_LLM_PROVIDER: &str = "anthropic";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_MAX_ITERATIONS: usize = 6;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_UPLOAD_DIR: &str = "media";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: DocForgeConfig) -> DocForgeConfig {
    let config = apply_ocr_defaults(config);
    let config = apply_llm_defaults(config);
    let config = apply_gateway_defaults(config);
    apply_logging_defaults(config)
}

fn apply_ocr_defaults(mut config: DocForgeConfig) -> DocForgeConfig {
    let ocr = &mut config.ocr;
    ocr.backend.get_or_insert_with(|| DEFAULT_OCR_BACKEND.to_string());
    ocr.endpoint.get_or_insert_with(|| DEFAULT_OCR_SPACE_ENDPOINT.to_string());
    ocr.language.get_or_insert_with(|| DEFAULT_OCR_LANGUAGE.to_string());
    ocr.timeout_secs.get_or_insert(DEFAULT_OCR_TIMEOUT_SECS);
    ocr.tesseract_bin.get_or_insert_with(|| DEFAULT_TESSERACT_BIN.to_string());
    config
}

fn apply_llm_defaults(mut config: DocForgeConfig) -> DocForgeConfig {
    let llm = &mut config.llm;
    llm.provider.get_or_insert_with(|| DEFAULT_LLM_PROVIDER.to_string());
    llm.base_url.get_or_insert_with(|| DEFAULT_ANTHROPIC_BASE_URL.to_string());
    llm.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    llm.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    llm.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    llm.max_iterations.get_or_insert(DEFAULT_MAX_ITERATIONS);
    llm.timeout_secs.get_or_insert(DEFAULT_LLM_TIMEOUT_SECS);
    config
}

fn apply_gateway_defaults(mut config: DocForgeConfig) -> DocForgeConfig {
    let gw = &mut config.gateway;
    gw.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    gw.port.get_or_insert(DEFAULT_PORT);
    gw.upload_dir.get_or_insert_with(|| DEFAULT_UPLOAD_DIR.into());
    gw.max_upload_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    config
}

fn apply_logging_defaults(mut config: DocForgeConfig) -> DocForgeConfig {
    let logging = &mut config.logging;
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.into());
    config
}
