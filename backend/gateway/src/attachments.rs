//! Document upload + extraction endpoint.

use std::path::{Path, PathBuf};

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::server::GatewayState;

pub const DEFAULT_PROMPT_LABEL: &str = "Default task";

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub ocr_output: String,
    pub llm_output: String,
    pub image_path: String,
    pub prompt: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to store upload: {0}")]
    Storage(#[from] std::io::Error),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadError::NoFile => StatusCode::BAD_REQUEST,
            UploadError::Multipart(e) => e.status(),
            UploadError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "Upload handling failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// Handler for `POST /api/process/`
#[instrument(skip_all)]
pub async fn process_document(
    State(state): State<GatewayState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, UploadError> {
    let mut upload: Option<Upload> = None;
    let mut prompt: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("document") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !file_name.is_empty() {
                    upload = Some(Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            Some("prompt") => {
                let text = field.text().await?;
                prompt = Some(text.trim().to_string()).filter(|p| !p.is_empty());
            }
            _ => {}
        }
    }

    let upload = upload.ok_or(UploadError::NoFile)?;
    let saved = save_upload(&state.upload_dir, &upload).await?;
    info!(path = %saved.display(), bytes = upload.bytes.len(), "Stored upload");

    let report = state.pipeline.run(&saved, prompt.as_deref()).await;

    Ok(Json(ProcessResponse {
        success: report.success,
        ocr_output: report.ocr_output,
        llm_output: report.llm_output,
        image_path: report.image_path,
        prompt: prompt.unwrap_or_else(|| DEFAULT_PROMPT_LABEL.to_string()),
    }))
}

async fn save_upload(upload_dir: &Path, upload: &Upload) -> std::io::Result<PathBuf> {
    let dir = upload_dir.join("uploads");
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(format!(
        "{}_{}",
        uuid::Uuid::new_v4().simple(),
        sanitize_file_name(&upload.file_name)
    ));
    tokio::fs::write(&path, &upload.bytes).await?;
    Ok(path)
}

/// Keep the client's base name, minus anything that could escape the upload dir.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(r"C:\scans\inv 01.png"), "inv_01.png");
        assert_eq!(sanitize_file_name("..."), "upload");
        assert_eq!(sanitize_file_name("receipt.jpg"), "receipt.jpg");
    }
}
