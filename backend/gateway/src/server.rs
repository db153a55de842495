//! Main HTTP gateway server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use docforge_agent::ExtractionPipeline;

use crate::{attachments, control_ui, health_api};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<ExtractionPipeline>,
    pub upload_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(pipeline: Arc<ExtractionPipeline>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            upload_dir: upload_dir.into(),
            started_at: Utc::now(),
        }
    }
}

pub fn router(state: GatewayState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/upload/", get(control_ui::upload_form))
        .route("/api/process/", post(attachments::process_document))
        .route("/api/health", get(health_api::get_health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState, max_upload_bytes: usize) -> Result<()> {
    let app = router(state, max_upload_bytes);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Gateway HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
