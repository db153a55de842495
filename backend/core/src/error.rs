use thiserror::Error;

/// Top-level error type for the docforge pipeline.
#[derive(Debug, Error)]
pub enum DocForgeError {
    #[error("unknown OCR backend: {0:?} (expected one of: tesseract, paddle, ocr_space)")]
    UnknownBackend(String),

    #[error("unknown LLM provider: {0:?} (expected one of: anthropic, mock)")]
    UnknownProvider(String),

    #[error("LLM provider error ({provider}): {message}")]
    LlmError { provider: String, message: String },

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
