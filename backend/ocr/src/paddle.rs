//! Bounding-box OCR: a detection + recognition model that reports one polygon and
//! one score per text line.
//!
//! Model loading is expensive, so the engine lives in a `LazyEngine` and is only
//! built when the first image arrives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use docforge_core::{BoundingBox, ExtractedItem, OcrBackendKind};

use crate::backend::OcrBackend;
use crate::error::OcrError;
use crate::lazy::LazyEngine;

/// Raw per-page output of a detection + recognition engine.
///
/// The three vectors are parallel; scores may be shorter or absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagePrediction {
    #[serde(default)]
    pub rec_texts: Vec<String>,
    #[serde(default)]
    pub rec_polys: Vec<Vec<(f64, f64)>>,
    #[serde(default)]
    pub rec_scores: Vec<Option<f64>>,
}

/// A loaded text detection + recognition model. Inference is blocking and read-only.
pub trait TextDetector: Send + Sync + 'static {
    fn predict(&self, image_path: &Path) -> Result<Vec<PagePrediction>, OcrError>;
}

pub struct PaddleBackend {
    engine: LazyEngine<Box<dyn TextDetector>>,
}

impl PaddleBackend {
    /// Build a backend whose engine is created by `factory` on first use.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn TextDetector>, OcrError> + Send + Sync + 'static,
    {
        Self {
            engine: LazyEngine::new("paddle", factory),
        }
    }

    /// Backend over the bundled model engine, loaded from the given model files.
    pub fn from_models(detection_model: Option<PathBuf>, recognition_model: Option<PathBuf>) -> Self {
        Self::with_factory(move || load_detector(detection_model.as_deref(), recognition_model.as_deref()))
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_initialized()
    }
}

#[cfg(feature = "ocrs")]
fn load_detector(
    detection_model: Option<&Path>,
    recognition_model: Option<&Path>,
) -> Result<Box<dyn TextDetector>, OcrError> {
    let (Some(det), Some(rec)) = (detection_model, recognition_model) else {
        return Err(OcrError::EngineUnavailable(
            "ocr.detectionModel and ocr.recognitionModel must both be set".to_string(),
        ));
    };
    Ok(Box::new(crate::ocrs_engine::OcrsDetector::load(det, rec)?))
}

#[cfg(not(feature = "ocrs"))]
fn load_detector(
    _detection_model: Option<&Path>,
    _recognition_model: Option<&Path>,
) -> Result<Box<dyn TextDetector>, OcrError> {
    Err(OcrError::EngineUnavailable(
        "bounding-box engine not compiled in; rebuild docforge-ocr with the `ocrs` feature".to_string(),
    ))
}

#[async_trait]
impl OcrBackend for PaddleBackend {
    fn kind(&self) -> OcrBackendKind {
        OcrBackendKind::Paddle
    }

    #[instrument(level = "debug", skip(self), fields(path = %image_path.display()))]
    async fn extract(&self, image_path: &Path) -> Result<Vec<ExtractedItem>, OcrError> {
        let engine: Arc<Box<dyn TextDetector>> = self.engine.get().await?;
        let path = image_path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || engine.predict(&path))
            .await
            .map_err(|e| OcrError::Engine(format!("inference task panicked: {e}")))??;
        debug!(pages = pages.len(), "Engine returned predictions");
        Ok(items_from_predictions(&pages))
    }
}

/// Normalize the first page: polygons become axis-aligned boxes, scores are
/// rounded to 4 decimals. Empty strings are dropped.
pub fn items_from_predictions(pages: &[PagePrediction]) -> Vec<ExtractedItem> {
    let Some(page) = pages.first() else {
        return Vec::new();
    };

    page.rec_texts
        .iter()
        .zip(&page.rec_polys)
        .enumerate()
        .filter(|(_, (text, _))| !text.trim().is_empty())
        .map(|(i, (text, poly))| {
            let mut item = ExtractedItem::text_only(text.clone());
            if let Some(bbox) = BoundingBox::from_points(poly.iter().copied()) {
                item = item.with_bbox(bbox);
            }
            if let Some(score) = page.rec_scores.get(i).copied().flatten() {
                item = item.with_confidence(score);
            }
            item
        })
        .collect()
}
