//! HTTP error mapping for the extraction service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::error::HighlightError;

/// Errors surfaced to the client. Everything else degrades to partial output
/// inside the pipeline and never reaches this layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::MalformedDocument(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "MALFORMED_DOCUMENT", msg)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<HighlightError> for ApiError {
    fn from(err: HighlightError) -> Self {
        match err {
            HighlightError::MalformedDocument(msg) => ApiError::MalformedDocument(msg),
            HighlightError::RequestError(msg) => ApiError::InvalidRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::InvalidRequest(err.body_text())
    }
}
