//! One-document extraction: agent run plus a direct OCR pass for display.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use docforge_config::LlmConfig;
use docforge_core::LlmProvider;
use docforge_ocr::OcrService;
use docforge_tools::default_registry;

use crate::agent_loop::AgentRunner;
use crate::system_prompt::PromptBuilder;
use crate::tool_dispatcher::ToolDispatcher;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// False only when the agent loop itself failed.
    pub success: bool,
    pub ocr_output: String,
    pub llm_output: String,
    pub image_path: String,
}

pub struct ExtractionPipeline {
    ocr: Arc<OcrService>,
    runner: AgentRunner,
}

impl ExtractionPipeline {
    /// Wire the OCR tool into a fresh agent over `provider`.
    pub fn new(ocr: Arc<OcrService>, provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        let dispatcher = Arc::new(ToolDispatcher::new(Arc::new(default_registry(ocr.clone()))));
        Self {
            runner: AgentRunner::new(provider, dispatcher, config),
            ocr,
        }
    }

    pub fn ocr(&self) -> &OcrService {
        &self.ocr
    }

    #[instrument(skip(self, instruction), fields(path = %image_path.display()))]
    pub async fn run(&self, image_path: &Path, instruction: Option<&str>) -> ExtractionReport {
        let task = PromptBuilder::task(image_path, instruction);

        let (success, llm_output) = match self.runner.run(&task).await {
            Ok(answer) => (true, answer),
            Err(e) => {
                error!(error = %format!("{e:#}"), "Agent execution failed");
                (false, format!("Agent execution failed: {e:#}"))
            }
        };

        let ocr_output = self.ocr.extract(image_path).await.plain_text();
        info!(success, ocr_chars = ocr_output.len(), "Extraction finished");

        ExtractionReport {
            success,
            ocr_output,
            llm_output,
            image_path: image_path.to_string_lossy().into_owned(),
        }
    }
}
