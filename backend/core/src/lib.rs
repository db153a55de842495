pub mod error;
pub mod message;
pub mod normalize;
pub mod tools;
pub mod traits;
pub mod types;

pub use error::DocForgeError;
pub use message::{ChatMessage, ContentBlock, ChatRole, StopReason, ToolSpec};
pub use normalize::normalize_output;
pub use tools::ToolRegistry;
pub use traits::{LlmProvider, LlmRequest, LlmResponse, Tool};
pub use types::{BoundingBox, ExtractedItem, OcrBackendKind, OcrOutcome};
