//! `ocrs` detection + recognition models as a `TextDetector`.

use std::path::Path;

use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::info;

use crate::error::OcrError;
use crate::paddle::{PagePrediction, TextDetector};

pub struct OcrsDetector {
    engine: OcrEngine,
}

impl OcrsDetector {
    pub fn load(detection_model: &Path, recognition_model: &Path) -> Result<Self, OcrError> {
        info!(
            detection = %detection_model.display(),
            recognition = %recognition_model.display(),
            "Loading ocrs models"
        );
        let detection = Model::load_file(detection_model).map_err(|e| {
            OcrError::EngineUnavailable(format!("cannot load {}: {e}", detection_model.display()))
        })?;
        let recognition = Model::load_file(recognition_model).map_err(|e| {
            OcrError::EngineUnavailable(format!("cannot load {}: {e}", recognition_model.display()))
        })?;
        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection),
            recognition_model: Some(recognition),
            ..Default::default()
        })
        .map_err(|e| OcrError::EngineUnavailable(e.to_string()))?;
        Ok(Self { engine })
    }
}

impl TextDetector for OcrsDetector {
    fn predict(&self, image_path: &Path) -> Result<Vec<PagePrediction>, OcrError> {
        let img = image::open(image_path)
            .map_err(|e| OcrError::Engine(format!("cannot decode image: {e}")))?
            .into_rgb8();
        let source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| OcrError::Engine(e.to_string()))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| OcrError::Engine(e.to_string()))?;

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|e| OcrError::Engine(e.to_string()))?;
        let lines = self.engine.find_text_lines(&input, &words);
        let texts = self
            .engine
            .recognize_text(&input, &lines)
            .map_err(|e| OcrError::Engine(e.to_string()))?;

        let mut page = PagePrediction::default();
        for line in texts.into_iter().flatten() {
            let corners = line.rotated_rect().corners();
            page.rec_texts.push(line.to_string());
            page.rec_polys
                .push(corners.iter().map(|p| (p.x as f64, p.y as f64)).collect());
            // ocrs does not expose per-line recognition scores.
            page.rec_scores.push(None);
        }
        Ok(vec![page])
    }
}
