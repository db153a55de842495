pub mod ocr_tool;

pub use ocr_tool::{OcrReadDocumentTool, OCR_TOOL_NAME};

use std::sync::Arc;

use docforge_core::ToolRegistry;
use docforge_ocr::OcrService;

/// Registry holding every tool the extraction agent may call.
pub fn default_registry(ocr: Arc<OcrService>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(OcrReadDocumentTool::new(ocr)));
    registry
}
