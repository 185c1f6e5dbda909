//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{health_check, home, list_artifacts, pipeline_stats, version_check};
use super::media::{download_audio, download_subtitle, download_video, serve_upload, upload_and_mux};
use super::subtitles::{
    generate_subtitles, process_subtitles, save_subtitles, upload_files, upload_srt,
};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes();
    let cors_enabled = state.config.cors_enabled;

    let router = Router::new()
        // Service endpoints
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Subtitle pipeline
        .route("/generate-subtitles", post(generate_subtitles))
        .route("/process-subtitles", post(process_subtitles))
        .route("/upload-srt", post(upload_srt))
        .route("/upload-files", post(upload_files))
        .route("/save-subtitles", post(save_subtitles))
        // Video muxing
        .route("/upload", post(upload_and_mux))
        // Downloads
        .route("/download/{filename}", get(download_subtitle))
        .route("/download-video/{filename}", get(download_video))
        .route("/download-audio/{filename}", get(download_audio))
        .route("/uploads/{filename}", get(serve_upload))
        // Debug endpoints
        .route("/debug/stats", get(pipeline_stats))
        .route("/debug/artifacts", get(list_artifacts))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state);

    if !cors_enabled {
        return router;
    }

    // Browser front-ends run on another origin during development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::HEAD])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .allow_private_network(true)
        .max_age(Duration::from_secs(3600));

    router.layer(cors)
}
