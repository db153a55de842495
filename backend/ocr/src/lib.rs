//! OCR backends for docforge.
//!
//! Every backend turns an image path into `ExtractedItem`s; `OcrService` selects the
//! configured backend and folds failures into an in-band `OcrOutcome`.

pub mod backend;
pub mod error;
pub mod lazy;
pub mod ocr_space;
#[cfg(feature = "ocrs")]
pub mod ocrs_engine;
pub mod paddle;
pub mod service;
pub mod tesseract;

pub use backend::OcrBackend;
pub use error::OcrError;
pub use lazy::LazyEngine;
pub use ocr_space::OcrSpaceBackend;
pub use paddle::{PaddleBackend, PagePrediction, TextDetector};
pub use service::OcrService;
pub use tesseract::TesseractBackend;
