use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use docforge_core::{ContentBlock, LlmProvider, LlmRequest, LlmResponse, StopReason};

/// Offline provider that replays scripted replies and records what it was sent.
///
/// Once the script runs out it answers with a fixed text reply.
pub struct MockProvider {
    script: Mutex<VecDeque<Result<LlmResponse, String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, content: Vec<ContentBlock>, stop_reason: StopReason) -> Self {
        self.push(Ok(LlmResponse {
            content,
            stop_reason,
            provider: "mock".to_string(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        }))
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.reply(vec![ContentBlock::text(text)], StopReason::EndTurn)
    }

    pub fn tool_call(self, id: &str, name: &str, input: serde_json::Value) -> Self {
        self.reply(
            vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input,
            }],
            StopReason::ToolUse,
        )
    }

    pub fn failure(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    fn push(self, entry: Result<LlmResponse, String>) -> Self {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(entry);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        let next = self.script.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(LlmResponse {
                content: vec![ContentBlock::text("Mock response")],
                stop_reason: StopReason::EndTurn,
                provider: "mock".to_string(),
                model: request.model.clone(),
                tokens_used: 0,
                latency_ms: 0,
            }),
        }
    }
}
