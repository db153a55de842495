//! Routes the model's tool calls to registered tools.

use std::sync::Arc;

use docforge_core::{ContentBlock, ToolRegistry};
use serde_json::Value;
use tracing::{debug, warn};

pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one call. Unknown tools and tool failures are reported back to the model
    /// as an error result so it can correct itself.
    pub async fn execute(&self, id: &str, name: &str, input: &Value) -> ContentBlock {
        let Some(tool) = self.registry.get(name) else {
            warn!(tool = name, "Model requested unknown tool");
            return ContentBlock::ToolResult {
                tool_use_id: id.to_string(),
                content: format!(
                    "Unknown tool '{name}'. Available tools: {}",
                    self.registry.list().join(", ")
                ),
                is_error: true,
            };
        };

        match tool.execute(input.clone()).await {
            Ok(output) => {
                debug!(tool = name, bytes = output.len(), "Tool finished");
                ContentBlock::ToolResult {
                    tool_use_id: id.to_string(),
                    content: output,
                    is_error: false,
                }
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                ContentBlock::ToolResult {
                    tool_use_id: id.to_string(),
                    content: format!("Error: {e}"),
                    is_error: true,
                }
            }
        }
    }

    /// Run calls in order, one result block per call.
    pub async fn execute_all(&self, calls: &[(&str, &str, &Value)]) -> Vec<ContentBlock> {
        let mut results = Vec::with_capacity(calls.len());
        for (id, name, input) in calls {
            results.push(self.execute(id, name, input).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docforge_core::Tool;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the input"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value) -> anyhow::Result<String> {
            match args.get("fail") {
                Some(_) => anyhow::bail!("asked to fail"),
                None => Ok(args.to_string()),
            }
        }
    }

    fn dispatcher() -> ToolDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        ToolDispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_known_tool_result() {
        let result = dispatcher().execute("t1", "echo", &json!({"a": 1})).await;
        assert_eq!(
            result,
            ContentBlock::ToolResult {
                tool_use_id: "t1".into(),
                content: r#"{"a":1}"#.into(),
                is_error: false,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let result = dispatcher().execute("t2", "shell", &json!({})).await;
        match result {
            ContentBlock::ToolResult { is_error, content, .. } => {
                assert!(is_error);
                assert!(content.contains("echo"));
            }
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_error_is_error_result() {
        let input = json!({"fail": true});
        let results = dispatcher().execute_all(&[("t3", "echo", &input)]).await;
        assert!(matches!(
            &results[0],
            ContentBlock::ToolResult { is_error: true, content, .. } if content.contains("asked to fail")
        ));
    }
}
