use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures inside an OCR backend. `OcrService` never lets these escape.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("engine error: {0}")]
    Engine(String),

    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("remote OCR error: {0}")]
    Remote(String),

    #[error("remote OCR returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },

    #[error("malformed OCR response: {0}")]
    MalformedResponse(String),

    #[error("remote OCR timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
