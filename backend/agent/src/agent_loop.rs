//! Core agent execution loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use docforge_config::LlmConfig;
use docforge_core::{normalize_output, ChatMessage, LlmProvider, LlmRequest};

use crate::system_prompt::PromptBuilder;
use crate::tool_dispatcher::ToolDispatcher;

pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit.";

/// Drives one conversation: ask the model, run the tools it calls, repeat until it
/// answers in plain text or `max_iterations` model calls have been made.
pub struct AgentRunner {
    provider: Arc<dyn LlmProvider>,
    dispatcher: Arc<ToolDispatcher>,
    system_prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: usize,
}

impl AgentRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, dispatcher: Arc<ToolDispatcher>, config: &LlmConfig) -> Self {
        Self {
            provider,
            dispatcher,
            system_prompt: PromptBuilder::system_prompt(),
            model: config.model().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            max_iterations: config.max_iterations(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Run the loop for `task` and return the model's final answer as display text.
    #[instrument(skip(self, task), fields(provider = self.provider.name(), model = %self.model))]
    pub async fn run(&self, task: &str) -> Result<String> {
        info!(max_iterations = self.max_iterations, "Starting agent loop");

        let mut messages = vec![ChatMessage::user(task)];
        let tools = self.dispatcher.registry().specs();

        for step in 1..=self.max_iterations {
            let request = LlmRequest {
                model: self.model.clone(),
                system_prompt: self.system_prompt.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            };

            let response = self
                .provider
                .chat(&request)
                .await
                .with_context(|| format!("LLM call failed at step {step}"))?;
            debug!(
                step,
                stop_reason = ?response.stop_reason,
                tokens = response.tokens_used,
                latency_ms = response.latency_ms,
                "Model replied"
            );

            let calls = response.tool_calls();
            if calls.is_empty() {
                let value = serde_json::to_value(&response.content)
                    .context("Failed to encode final model reply")?;
                info!(steps = step, "Agent produced final answer");
                return Ok(normalize_output(&value));
            }

            info!(step, calls = calls.len(), "Agent invoked tools");
            let results = self.dispatcher.execute_all(&calls).await;
            messages.push(ChatMessage::assistant(response.content.clone()));
            messages.push(ChatMessage::tool_results(results));
        }

        warn!(max_iterations = self.max_iterations, "Iteration limit reached");
        Ok(ITERATION_LIMIT_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docforge_core::{ChatRole, ContentBlock, StopReason, Tool, ToolRegistry};
    use docforge_planner::MockProvider;
    use serde_json::{json, Value};

    struct StaticOcr;

    #[async_trait]
    impl Tool for StaticOcr {
        fn name(&self) -> &str {
            "ocr_read_document"
        }
        fn description(&self) -> &str {
            "OCR"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value) -> anyhow::Result<String> {
            Ok(r#"[{"text":"Total: 42.00 EUR"}]"#.to_string())
        }
    }

    fn runner(provider: Arc<MockProvider>, max_iterations: usize) -> AgentRunner {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticOcr));
        let config = LlmConfig {
            max_iterations: Some(max_iterations),
            ..Default::default()
        };
        AgentRunner::new(provider, Arc::new(ToolDispatcher::new(Arc::new(registry))), &config)
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let provider = Arc::new(
            MockProvider::new()
                .tool_call("toolu_1", "ocr_read_document", json!({"image_path": "inv.png"}))
                .reply(
                    vec![ContentBlock::text("Total: 42.00"), ContentBlock::text("Currency: EUR")],
                    StopReason::EndTurn,
                ),
        );
        let answer = runner(provider.clone(), 6).run("Get the total").await.unwrap();
        assert_eq!(answer, "Total: 42.00\n\nCurrency: EUR");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools[0].name, "ocr_read_document");
        assert_eq!(requests[0].model, "claude-3-haiku-20240307");
        assert_eq!(requests[0].max_tokens, 800);

        let second = &requests[1].messages;
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, ChatRole::Assistant);
        assert!(matches!(
            &second[2].content[0],
            ContentBlock::ToolResult { tool_use_id, content, is_error: false }
                if tool_use_id == "toolu_1" && content.contains("42.00")
        ));
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let mut provider = MockProvider::new();
        for i in 0..5 {
            provider = provider.tool_call(&format!("toolu_{i}"), "ocr_read_document", json!({}));
        }
        let provider = Arc::new(provider);
        let answer = runner(provider.clone(), 3).run("loop forever").await.unwrap();
        assert_eq!(answer, ITERATION_LIMIT_MESSAGE);
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = Arc::new(MockProvider::new().failure("overloaded"));
        let err = runner(provider, 6).run("task").await.unwrap_err();
        assert!(format!("{err:#}").contains("overloaded"));
    }
}
