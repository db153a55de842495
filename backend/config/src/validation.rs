//! Config validation with user-friendly error messages.

use crate::schema::DocForgeConfig;
use docforge_core::OcrBackendKind;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &DocForgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_ocr(config, &mut report);
    validate_llm(config, &mut report);
    validate_gateway(config, &mut report);
    report
}

fn validate_ocr(config: &DocForgeConfig, report: &mut ValidationReport) {
    let ocr = &config.ocr;
    match ocr.backend().parse::<OcrBackendKind>() {
        Err(e) => report.error("ocr.backend", e.to_string()),
        Ok(OcrBackendKind::OcrSpace) => {
            if ocr.api_key.as_deref().map(str::is_empty).unwrap_or(true) {
                report.warn("ocr.apiKey", "OCR.space backend selected without an API key");
            }
        }
        Ok(OcrBackendKind::Paddle) => {
            if ocr.detection_model.is_none() || ocr.recognition_model.is_none() {
                report.warn(
                    "ocr.detectionModel",
                    "Bounding-box backend needs detectionModel and recognitionModel paths",
                );
            }
        }
        Ok(OcrBackendKind::Tesseract) => {}
    }
    if ocr.timeout_secs == Some(0) {
        report.error("ocr.timeoutSecs", "timeoutSecs must be >= 1");
    }
}

fn validate_llm(config: &DocForgeConfig, report: &mut ValidationReport) {
    let llm = &config.llm;
    match llm.provider() {
        "anthropic" => {
            if llm.api_key.as_deref().map(str::is_empty).unwrap_or(true) {
                report.warn("llm.apiKey", "No Anthropic API key configured; agent calls will fail");
            }
        }
        "mock" => {}
        other => report.error(
            "llm.provider",
            format!("Unknown provider '{other}'. Use 'anthropic' or 'mock'"),
        ),
    }
    let temperature = llm.temperature();
    if !(0.0..=1.0).contains(&temperature) {
        report.error("llm.temperature", format!("temperature {temperature} must be within [0, 1]"));
    }
    if llm.max_tokens == Some(0) {
        report.error("llm.maxTokens", "maxTokens must be >= 1");
    }
    if llm.max_iterations == Some(0) {
        report.error("llm.maxIterations", "maxIterations must be >= 1");
    }
    if llm.timeout_secs == Some(0) {
        report.error("llm.timeoutSecs", "timeoutSecs must be >= 1");
    }
}

fn validate_gateway(config: &DocForgeConfig, report: &mut ValidationReport) {
    let gw = &config.gateway;
    if let Some(port) = gw.port {
        if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "gateway.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if gw.max_upload_bytes == Some(0) {
        report.error("gateway.maxUploadBytes", "maxUploadBytes must be > 0");
    }
}
