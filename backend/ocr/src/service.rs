//! Backend selection plus the in-band result contract.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use docforge_config::OcrConfig;
use docforge_core::{DocForgeError, OcrBackendKind, OcrOutcome};

use crate::backend::OcrBackend;
use crate::error::OcrError;
use crate::ocr_space::OcrSpaceBackend;
use crate::paddle::PaddleBackend;
use crate::tesseract::TesseractBackend;

/// The configured OCR backend. Constructing it never loads an engine.
#[derive(Clone)]
pub struct OcrService {
    backend: Arc<dyn OcrBackend>,
}

impl OcrService {
    pub fn from_config(config: &OcrConfig) -> Result<Self, DocForgeError> {
        let kind: OcrBackendKind = config.backend().parse()?;
        let backend: Arc<dyn OcrBackend> = match kind {
            OcrBackendKind::Tesseract => Arc::new(TesseractBackend::new(
                config.tesseract_bin(),
                config.language(),
            )),
            OcrBackendKind::Paddle => Arc::new(PaddleBackend::from_models(
                config.detection_model.clone(),
                config.recognition_model.clone(),
            )),
            OcrBackendKind::OcrSpace => Arc::new(
                OcrSpaceBackend::new(config.api_key.clone().unwrap_or_default(), config.timeout())
                    .with_endpoint(config.endpoint())
                    .with_language(config.language()),
            ),
        };
        info!(backend = %kind, "OCR backend selected");
        Ok(Self { backend })
    }

    pub fn with_backend(backend: Arc<dyn OcrBackend>) -> Self {
        Self { backend }
    }

    pub fn kind(&self) -> OcrBackendKind {
        self.backend.kind()
    }

    /// Run OCR on `image_path`. Failures come back as an `Error` record, never a panic
    /// or an `Err`, so the agent can read them like any other tool output.
    pub async fn extract(&self, image_path: &Path) -> OcrOutcome {
        if !tokio::fs::try_exists(image_path).await.unwrap_or(false) {
            let err = OcrError::NotFound {
                path: image_path.to_path_buf(),
            };
            warn!(path = %image_path.display(), "OCR input missing");
            return OcrOutcome::Error(format!("OCR failed: {err}"));
        }

        match self.backend.extract(image_path).await {
            Ok(items) => {
                info!(
                    backend = %self.kind(),
                    items = items.len(),
                    path = %image_path.display(),
                    "OCR complete"
                );
                OcrOutcome::from_items(items)
            }
            Err(e) => {
                warn!(backend = %self.kind(), error = %e, "OCR failed");
                OcrOutcome::Error(format!("OCR failed: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use docforge_core::ExtractedItem;

    use crate::paddle::{PagePrediction, TextDetector};

    struct CountingBackend {
        calls: AtomicUsize,
        result: fn() -> Result<Vec<ExtractedItem>, OcrError>,
    }

    #[async_trait]
    impl OcrBackend for CountingBackend {
        fn kind(&self) -> OcrBackendKind {
            OcrBackendKind::Tesseract
        }

        async fn extract(&self, _: &Path) -> Result<Vec<ExtractedItem>, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn counting(result: fn() -> Result<Vec<ExtractedItem>, OcrError>) -> Arc<CountingBackend> {
        Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
            result,
        })
    }

    fn scratch_image() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, b"png").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn missing_image_skips_engine() {
        let backend = counting(|| Ok(vec![]));
        let service = OcrService::with_backend(backend.clone());

        let outcome = service.extract(Path::new("/no/such/scan.png")).await;
        match outcome {
            OcrOutcome::Error(message) => {
                assert!(message.starts_with("OCR failed: "), "{message}");
                assert!(message.contains("/no/such/scan.png"));
            }
            other => panic!("expected error record, got {other:?}"),
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn engine_failure_becomes_error_record() {
        let service = OcrService::with_backend(counting(|| {
            Err(OcrError::Engine("tesseract exited with 1: bad image".into()))
        }));
        let (_dir, image) = scratch_image();

        let outcome = service.extract(&image).await;
        assert_eq!(
            outcome.to_json(),
            serde_json::json!([{ "error": "OCR failed: engine error: tesseract exited with 1: bad image" }])
        );
    }

    #[tokio::test]
    async fn empty_page_is_a_warning() {
        let service = OcrService::with_backend(counting(|| Ok(vec![])));
        let (_dir, image) = scratch_image();

        let outcome = service.extract(&image).await;
        assert!(outcome.is_warning());
        assert_eq!(outcome.to_json(), serde_json::json!([{ "warning": "No text detected" }]));
    }

    #[tokio::test]
    async fn items_pass_through() {
        let service = OcrService::with_backend(counting(|| {
            Ok(vec![ExtractedItem::text_only("Hello"), ExtractedItem::text_only("World")])
        }));
        let (_dir, image) = scratch_image();

        let outcome = service.extract(&image).await;
        assert_eq!(outcome.plain_text(), "Hello\nWorld");
    }

    #[test]
    fn unknown_backend_rejected_at_construction() {
        let config = OcrConfig {
            backend: Some("abbyy".into()),
            ..Default::default()
        };
        let err = OcrService::from_config(&config).err().unwrap();
        assert!(matches!(err, DocForgeError::UnknownBackend(ref b) if b == "abbyy"));
    }

    #[test]
    fn backend_aliases_select_kind() {
        let config = OcrConfig {
            backend: Some("remote".into()),
            api_key: Some("K".into()),
            ..Default::default()
        };
        let service = OcrService::from_config(&config).unwrap();
        assert_eq!(service.kind(), OcrBackendKind::OcrSpace);
    }

    struct OnePage;

    impl TextDetector for OnePage {
        fn predict(&self, _: &Path) -> Result<Vec<PagePrediction>, OcrError> {
            Ok(vec![PagePrediction {
                rec_texts: vec!["Total 42".into()],
                rec_polys: vec![vec![(1.0, 1.0), (20.0, 1.0), (20.0, 8.0), (1.0, 8.0)]],
                rec_scores: vec![Some(0.912345)],
            }])
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_builds_engine_once() {
        static BUILDS: AtomicUsize = AtomicUsize::new(0);
        let paddle = PaddleBackend::with_factory(|| {
            BUILDS.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(50));
            Ok(Box::new(OnePage) as Box<dyn TextDetector>)
        });
        let service = OcrService::with_backend(Arc::new(paddle));
        let (_dir, image) = scratch_image();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                let image = image.clone();
                tokio::spawn(async move { service.extract(&image).await })
            })
            .collect();
        for task in tasks {
            let outcome = task.await.unwrap();
            assert_eq!(outcome.items()[0].confidence, Some(0.9123));
        }
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    }
}
