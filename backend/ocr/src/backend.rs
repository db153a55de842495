use std::path::Path;

use async_trait::async_trait;
use docforge_core::{ExtractedItem, OcrBackendKind};

use crate::error::OcrError;

/// One OCR engine or service, normalized to the shared item shape.
///
/// Implementations may assume the path exists; `OcrService` checks that first.
/// An empty `Ok` means the engine ran and found no text.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    fn kind(&self) -> OcrBackendKind;

    async fn extract(&self, image_path: &Path) -> Result<Vec<ExtractedItem>, OcrError>;
}
