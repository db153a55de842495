use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docforge_core::{ChatMessage, ContentBlock, LlmProvider, LlmRequest, LlmResponse, StopReason, ToolSpec};

const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider with native tool use.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolSpec],
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();

        // Blocks we could not parse are never echoed back.
        let messages = request
            .messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m
                    .content
                    .iter()
                    .filter(|b| !matches!(b, ContentBlock::Unknown))
                    .cloned()
                    .collect(),
            })
            .collect();

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system_prompt,
            messages,
            tools: &request.tools,
        };

        debug!(
            model = %request.model,
            turns = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to Anthropic"
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("Anthropic HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic returned {}: {}", status, error_body);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic response")?;

        let tokens_used = parsed
            .usage
            .map(|u| u.input_tokens.unwrap_or(0) + u.output_tokens.unwrap_or(0))
            .unwrap_or(0);

        Ok(LlmResponse {
            content: parsed.content,
            stop_reason: parsed
                .stop_reason
                .as_deref()
                .map(StopReason::from_wire)
                .unwrap_or(StopReason::EndTurn),
            provider: "anthropic".to_string(),
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn request() -> LlmRequest {
        LlmRequest {
            model: "claude-3-haiku-20240307".into(),
            system_prompt: "Extract fields.".into(),
            messages: vec![ChatMessage::user("Read /tmp/a.png")],
            tools: vec![ToolSpec {
                name: "ocr_read_document".into(),
                description: "OCR".into(),
                input_schema: json!({"type": "object"}),
            }],
            max_tokens: 800,
            temperature: 0.3,
        }
    }

    #[tokio::test]
    async fn test_tool_use_reply_is_parsed() {
        let app = Router::new().route(
            "/v1/messages",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers.get("x-api-key").unwrap(), "sk-test");
                assert_eq!(headers.get("anthropic-version").unwrap(), API_VERSION);
                assert_eq!(body["system"], "Extract fields.");
                assert_eq!(body["max_tokens"], 800);
                assert_eq!(body["tools"][0]["name"], "ocr_read_document");
                assert_eq!(body["messages"][0]["content"][0]["type"], "text");
                Json(json!({
                    "id": "msg_1",
                    "model": "claude-3-haiku-20240307",
                    "stop_reason": "tool_use",
                    "content": [
                        { "type": "text", "text": "Reading the document." },
                        { "type": "tool_use", "id": "toolu_1", "name": "ocr_read_document",
                          "input": { "image_path": "/tmp/a.png" } }
                    ],
                    "usage": { "input_tokens": 120, "output_tokens": 30 }
                }))
            }),
        );
        let base = spawn_stub(app).await;

        let provider = AnthropicProvider::new("sk-test").with_base_url(base);
        let reply = provider.chat(&request()).await.unwrap();

        assert_eq!(reply.stop_reason, StopReason::ToolUse);
        assert_eq!(reply.tokens_used, 150);
        let calls = reply.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "ocr_read_document");
        assert_eq!(calls[0].2["image_path"], "/tmp/a.png");
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let app = Router::new().route(
            "/v1/messages",
            post(|| async { (StatusCode::UNAUTHORIZED, r#"{"error":"invalid x-api-key"}"#) }),
        );
        let base = spawn_stub(app).await;

        let provider = AnthropicProvider::new("bad").with_base_url(base);
        let err = provider.chat(&request()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains("invalid x-api-key"), "{msg}");
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let app = Router::new().route(
            "/v1/messages",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let base = spawn_stub(app).await;

        let provider = AnthropicProvider::new("k")
            .with_base_url(base)
            .with_timeout(Duration::from_millis(200));
        assert!(provider.chat(&request()).await.is_err());
    }
}
