//! Remote OCR through the OCR.space HTTP API.
//!
//! Request: multipart upload to `/parse/image` with the key in an `apikey` header.
//! Response: `ParsedResults[].TextOverlay.Lines[].Words[]` with pixel rectangles, plus
//! a flat `ParsedText` fallback.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use docforge_core::{BoundingBox, ExtractedItem, OcrBackendKind};

use crate::backend::OcrBackend;
use crate::error::OcrError;
use crate::tesseract::items_from_plain_text;

pub struct OcrSpaceBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    language: String,
    timeout: Duration,
}

impl OcrSpaceBackend {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: "https://api.ocr.space/parse/image".to_string(),
            api_key: api_key.into(),
            language: "eng".to_string(),
            timeout,
        }
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(rename = "OCRExitCode", default)]
    ocr_exit_code: Option<i64>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    text_overlay: Option<TextOverlay>,
    #[serde(default)]
    parsed_text: Option<String>,
    #[serde(default)]
    error_message: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TextOverlay {
    #[serde(default)]
    lines: Vec<OverlayLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OverlayLine {
    #[serde(default)]
    line_text: String,
    #[serde(default)]
    words: Vec<OverlayWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OverlayWord {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

#[async_trait]
impl OcrBackend for OcrSpaceBackend {
    fn kind(&self) -> OcrBackendKind {
        OcrBackendKind::OcrSpace
    }

    #[instrument(level = "debug", skip(self), fields(path = %image_path.display()))]
    async fn extract(&self, image_path: &Path) -> Result<Vec<ExtractedItem>, OcrError> {
        let bytes = tokio::fs::read(image_path).await?;
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.png".to_string());

        let mut form = Form::new()
            .text("language", self.language.clone())
            .text("isOverlayRequired", "true")
            .text("OCREngine", "2");
        if let Some(ext) = image_path.extension() {
            form = form.text("filetype", ext.to_string_lossy().to_uppercase());
        }
        form = form.part("file", Part::bytes(bytes).file_name(file_name));

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(status = %status, latency_ms = start.elapsed().as_millis() as u64, "OCR.space responded");

        if !status.is_success() {
            return Err(OcrError::RemoteStatus {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        items_from_response(&body)
    }
}

impl OcrSpaceBackend {
    fn transport_error(&self, e: reqwest::Error) -> OcrError {
        if e.is_timeout() {
            OcrError::Timeout(self.timeout)
        } else {
            OcrError::Remote(e.to_string())
        }
    }
}

/// Parse an OCR.space JSON body into items.
fn items_from_response(body: &str) -> Result<Vec<ExtractedItem>, OcrError> {
    let parsed: OcrSpaceResponse =
        serde_json::from_str(body).map_err(|e| OcrError::MalformedResponse(e.to_string()))?;

    // 1 = parsed, 2 = partially parsed; 3 and 4 are failures.
    let exit_ok = matches!(parsed.ocr_exit_code, None | Some(1) | Some(2));
    if parsed.is_errored_on_processing || !exit_ok {
        let message = parsed
            .error_message
            .as_ref()
            .map(render_message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("processing failed (OCRExitCode {:?})", parsed.ocr_exit_code));
        return Err(OcrError::Remote(message));
    }

    let results = parsed
        .parsed_results
        .ok_or_else(|| OcrError::MalformedResponse("missing ParsedResults".to_string()))?;

    let pages = results.len();
    let mut page_errors = Vec::new();
    let mut items = Vec::new();
    for result in results {
        if let Some(message) = result.error_message.as_ref().map(render_message).filter(|m| !m.is_empty()) {
            debug!(message = %message, "OCR.space reported a per-page error");
            page_errors.push(message);
        }
        let lines = result.text_overlay.map(|o| o.lines).unwrap_or_default();
        if lines.is_empty() {
            items.extend(items_from_plain_text(result.parsed_text.as_deref().unwrap_or("")));
            continue;
        }
        for line in lines {
            let text = line.line_text.trim();
            if text.is_empty() {
                continue;
            }
            let bbox = line
                .words
                .iter()
                .map(|w| BoundingBox::from_rect(w.left, w.top, w.width, w.height))
                .reduce(|a, b| a.union(&b));
            let mut item = ExtractedItem::text_only(text);
            if let Some(bbox) = bbox {
                item = item.with_bbox(bbox);
            }
            items.push(item);
        }
    }

    // Every page failed: that is an error, not an empty document.
    if items.is_empty() && pages > 0 && page_errors.len() == pages {
        return Err(OcrError::Remote(page_errors.join("; ")));
    }
    Ok(items)
}

/// `ErrorMessage` is a string on some endpoints and a list of strings on others.
fn render_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Multipart, http::HeaderMap, routing::post, Json, Router};
    use serde_json::json;

    const OVERLAY_BODY: &str = r#"{
        "ParsedResults": [{
            "TextOverlay": {
                "Lines": [
                    { "LineText": "Invoice 7781", "Words": [
                        { "WordText": "Invoice", "Left": 10, "Top": 12, "Width": 60, "Height": 14 },
                        { "WordText": "7781", "Left": 75, "Top": 10, "Width": 30, "Height": 18 }
                    ]},
                    { "LineText": "   ", "Words": [] }
                ],
                "HasOverlay": true
            },
            "FileParseExitCode": 1,
            "ParsedText": "Invoice 7781\r\n",
            "ErrorMessage": ""
        }],
        "OCRExitCode": 1,
        "IsErroredOnProcessing": false
    }"#;

    #[test]
    fn overlay_lines_become_boxed_items() {
        let items = items_from_response(OVERLAY_BODY).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Invoice 7781");
        assert_eq!(items[0].bbox, Some(BoundingBox::from([10.0, 10.0, 105.0, 28.0])));
        assert_eq!(items[0].confidence, None);
    }

    #[test]
    fn parsed_text_used_without_overlay() {
        let body = json!({
            "ParsedResults": [{ "ParsedText": "Total\r\n42.00\r\n" }],
            "OCRExitCode": 1
        });
        let items = items_from_response(&body.to_string()).unwrap();
        let texts: Vec<_> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, ["Total", "42.00"]);
    }

    #[test]
    fn api_level_error_is_reported() {
        let body = json!({
            "OCRExitCode": 99,
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["Unable to recognize the file type", "E216"]
        });
        let err = items_from_response(&body.to_string()).unwrap_err();
        assert!(matches!(err, OcrError::Remote(ref m) if m.contains("Unable to recognize")));
    }

    #[test]
    fn failed_only_page_is_an_error_not_empty() {
        let body = json!({
            "ParsedResults": [{
                "ParsedText": "",
                "FileParseExitCode": -10,
                "ErrorMessage": "Unable to parse page 1"
            }],
            "OCRExitCode": 2,
            "IsErroredOnProcessing": false
        });
        let err = items_from_response(&body.to_string()).unwrap_err();
        assert!(matches!(err, OcrError::Remote(ref m) if m == "Unable to parse page 1"), "{err}");
    }

    #[test]
    fn blank_page_without_error_is_empty() {
        let body = json!({
            "ParsedResults": [{ "ParsedText": "", "ErrorMessage": "" }],
            "OCRExitCode": 1
        });
        assert!(items_from_response(&body.to_string()).unwrap().is_empty());
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = items_from_response("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, OcrError::MalformedResponse(_)));
    }

    async fn spawn_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/parse/image")
    }

    fn sample_image() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.jpg");
        std::fs::write(&path, b"\xff\xd8\xff fake jpeg").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn sends_key_and_file_to_endpoint() {
        let app = Router::new().route(
            "/parse/image",
            post(|headers: HeaderMap, mut multipart: Multipart| async move {
                assert_eq!(headers.get("apikey").unwrap(), "K-test");
                let mut saw_file = false;
                while let Some(field) = multipart.next_field().await.unwrap() {
                    if field.name() == Some("file") {
                        assert_eq!(field.file_name(), Some("receipt.jpg"));
                        saw_file = true;
                    }
                }
                assert!(saw_file);
                Json(serde_json::from_str::<Value>(OVERLAY_BODY).unwrap())
            }),
        );
        let url = spawn_stub(app).await;
        let (_dir, image) = sample_image();

        let backend = OcrSpaceBackend::new("K-test", Duration::from_secs(5)).with_endpoint(url);
        let items = backend.extract(&image).await.unwrap();
        assert_eq!(items[0].text, "Invoice 7781");
    }

    #[tokio::test]
    async fn http_failure_status_is_reported() {
        let app = Router::new().route(
            "/parse/image",
            post(|| async { (axum::http::StatusCode::FORBIDDEN, "invalid api key") }),
        );
        let url = spawn_stub(app).await;
        let (_dir, image) = sample_image();

        let backend = OcrSpaceBackend::new("bad", Duration::from_secs(5)).with_endpoint(url);
        let err = backend.extract(&image).await.unwrap_err();
        assert!(matches!(err, OcrError::RemoteStatus { status: 403, .. }), "{err}");
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let app = Router::new().route(
            "/parse/image",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let url = spawn_stub(app).await;
        let (_dir, image) = sample_image();

        let backend = OcrSpaceBackend::new("K", Duration::from_millis(200)).with_endpoint(url);
        let err = backend.extract(&image).await.unwrap_err();
        assert!(matches!(err, OcrError::Timeout(_)), "{err}");
    }
}
