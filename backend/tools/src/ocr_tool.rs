use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use docforge_core::Tool;
use docforge_ocr::OcrService;

pub const OCR_TOOL_NAME: &str = "ocr_read_document";

/// Exposes the configured OCR backend to the agent.
///
/// Output is the JSON list of extracted items, or a single `warning`/`error` record.
pub struct OcrReadDocumentTool {
    ocr: Arc<OcrService>,
}

impl OcrReadDocumentTool {
    pub fn new(ocr: Arc<OcrService>) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl Tool for OcrReadDocumentTool {
    fn name(&self) -> &str {
        OCR_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Extract text from a document image. Returns a JSON list of items with \"text\" and, \
         when the engine reports them, \"bbox\" [x_min, y_min, x_max, y_max] and \"confidence\". \
         Returns [{\"warning\": ...}] when no text is found and [{\"error\": ...}] on failure."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "image_path": {
                    "type": "string",
                    "description": "Path to the image file to read"
                }
            },
            "required": ["image_path"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let image_path = args["image_path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'image_path' argument"))?;
        debug!(image_path, "Agent requested OCR");

        let outcome = self.ocr.extract(Path::new(image_path)).await;
        Ok(outcome.to_json().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docforge_core::{ExtractedItem, OcrBackendKind};
    use docforge_ocr::{OcrBackend, OcrError};

    struct FixedBackend;

    #[async_trait]
    impl OcrBackend for FixedBackend {
        fn kind(&self) -> OcrBackendKind {
            OcrBackendKind::Tesseract
        }

        async fn extract(&self, _: &Path) -> Result<Vec<ExtractedItem>, OcrError> {
            Ok(vec![ExtractedItem::text_only("ACME Corp")])
        }
    }

    fn tool() -> OcrReadDocumentTool {
        OcrReadDocumentTool::new(Arc::new(OcrService::with_backend(Arc::new(FixedBackend))))
    }

    #[tokio::test]
    async fn returns_items_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("letter.png");
        std::fs::write(&image, b"png").unwrap();

        let out = tool()
            .execute(serde_json::json!({ "image_path": image.to_str().unwrap() }))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, serde_json::json!([{ "text": "ACME Corp" }]));
    }

    #[tokio::test]
    async fn missing_file_is_an_error_record_not_a_failure() {
        let out = tool()
            .execute(serde_json::json!({ "image_path": "/nope/scan.png" }))
            .await
            .unwrap();
        assert!(out.contains("\"error\""));
        assert!(out.contains("OCR failed: Image not found"));
    }

    #[tokio::test]
    async fn missing_argument_fails() {
        let err = tool().execute(serde_json::json!({})).await.unwrap_err();
        assert!(err.to_string().contains("image_path"));
    }
}
