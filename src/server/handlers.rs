//! Request handlers
//!
//! - `POST /api/manual`: multipart PDF upload → per-page highlights and images
//! - `GET /health`

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::HighlightError;
use crate::pipeline::PageResult;
use crate::pipeline::document_runner::extract_document;
use crate::server::AppState;
use crate::server::error::ApiError;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /api/manual
///
/// Reads the document from the configured upload field; all other fields are
/// ignored. Extraction runs on the blocking pool.
pub async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<PageResult>>, ApiError> {
    let mut document: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(state.settings.upload_field.as_str()) {
            document = Some(field.bytes().await?.to_vec());
            break;
        }
        debug!(field = ?field.name(), "ignoring multipart field");
    }

    let Some(bytes) = document else {
        return Err(HighlightError::request(format!(
            "missing '{}' field",
            state.settings.upload_field
        ))
        .into());
    };

    info!(bytes = bytes.len(), "extract request");

    let settings = state.settings.clone();
    let pages = tokio::task::spawn_blocking(move || extract_document(&bytes, &settings))
        .await
        .map_err(|e| ApiError::Internal(format!("extraction task failed: {e}")))??;

    Ok(Json(pages))
}
