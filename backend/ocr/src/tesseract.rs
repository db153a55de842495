//! Local raster OCR via the `tesseract` CLI.
//!
//! Tesseract returns flat text only, so every non-empty line becomes one item with
//! no bounding box and no confidence.

use std::path::Path;
use std::process::Command as StdCommand;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use docforge_core::{ExtractedItem, OcrBackendKind};

use crate::backend::OcrBackend;
use crate::error::OcrError;
use crate::lazy::LazyEngine;

/// A verified tesseract installation.
#[derive(Debug)]
pub struct TesseractEngine {
    bin: String,
    version: String,
}

impl TesseractEngine {
    /// Probe `<bin> --version` so a missing install is reported once, clearly.
    pub fn probe(bin: &str) -> Result<Self, OcrError> {
        let output = StdCommand::new(bin).arg("--version").output().map_err(|e| {
            OcrError::EngineUnavailable(format!("tesseract binary '{bin}' is not runnable: {e}"))
        })?;
        if !output.status.success() {
            return Err(OcrError::EngineUnavailable(format!(
                "'{bin} --version' exited with {}",
                output.status
            )));
        }
        // Older releases print the banner on stderr.
        let banner = [output.stdout.as_slice(), output.stderr.as_slice()]
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .find_map(|s| s.lines().map(str::trim).find(|l| !l.is_empty()).map(str::to_string))
            .unwrap_or_else(|| "tesseract (unknown version)".to_string());
        Ok(Self {
            bin: bin.to_string(),
            version: banner,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

pub struct TesseractBackend {
    engine: LazyEngine<TesseractEngine>,
    language: String,
}

impl TesseractBackend {
    pub fn new(bin: impl Into<String>, language: impl Into<String>) -> Self {
        let bin = bin.into();
        Self {
            engine: LazyEngine::new("tesseract", move || TesseractEngine::probe(&bin)),
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn kind(&self) -> OcrBackendKind {
        OcrBackendKind::Tesseract
    }

    #[instrument(level = "debug", skip(self), fields(path = %image_path.display()))]
    async fn extract(&self, image_path: &Path) -> Result<Vec<ExtractedItem>, OcrError> {
        let engine = self.engine.get().await?;
        debug!(version = %engine.version, lang = %self.language, "Running tesseract");

        let output = Command::new(&engine.bin)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| OcrError::Engine(format!("cannot run tesseract: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(items_from_plain_text(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// One item per non-empty, trimmed line.
pub fn items_from_plain_text(text: &str) -> Vec<ExtractedItem> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ExtractedItem::text_only)
        .collect()
}
