//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with all endpoints
//! - Subtitle pipeline handlers (transcribe, import, edit, save)
//! - Video muxing and file downloads
//! - Multipart upload collection
//! - CORS middleware

pub mod handlers;
pub mod media;
pub mod routes;
pub mod subtitles;
pub mod upload;

pub use routes::create_router;
