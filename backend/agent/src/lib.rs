//! docforge agent runner
//!
//! A small tool-calling loop over an `LlmProvider`, the dispatcher that routes tool
//! calls into the registry, and the extraction pipeline that ties OCR and the agent
//! together for one document.

pub mod agent_loop;
pub mod pipeline;
pub mod system_prompt;
pub mod tool_dispatcher;

pub use agent_loop::{AgentRunner, ITERATION_LIMIT_MESSAGE};
pub use pipeline::{ExtractionPipeline, ExtractionReport};
pub use system_prompt::PromptBuilder;
pub use tool_dispatcher::ToolDispatcher;
