//! HTTP request handlers
//!
//! Error mapping plus the small service endpoints (health, version,
//! debug). Subtitle and media handlers live in their own modules.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::error::{AppError, FfmpegError};
use crate::state::AppState;

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    NotFound(String),
    /// Transcription or muxing failed; carries the adapter's message
    Upstream(String),
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::NotFound(name) => (StatusCode::NOT_FOUND, format!("File not found: {}", name)),
            HttpError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            HttpError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => HttpError::BadRequest(msg),
            AppError::NotFound(name) => HttpError::NotFound(name),
            AppError::Upstream(e) => HttpError::Upstream(e.to_string()),
            AppError::Ffmpeg(e @ (FfmpegError::OpenInput(_) | FfmpegError::MissingStream(_))) => {
                HttpError::BadRequest(format!("Unsupported media: {}", e))
            }
            _ => HttpError::InternalError(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for HttpError {
    fn from(err: tokio::task::JoinError) -> Self {
        HttpError::InternalError(err.to_string())
    }
}

/// Root endpoint
/// GET /
pub async fn home() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Backend is running!" }))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("subtitle-forge v", env!("CARGO_PKG_VERSION"))
}

/// Debug endpoint - pipeline counters
pub async fn pipeline_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "stats": state.stats.snapshot(),
        "artifacts": state.artifacts.len(),
    }))
}

/// Debug endpoint - produced files
pub async fn list_artifacts(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let artifacts = state.list_artifacts();

    Json(serde_json::json!({
        "count": artifacts.len(),
        "artifacts": artifacts,
    }))
}
