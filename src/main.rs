//! Subtitle Forge
//!
//! HTTP service that turns speech recordings, SRT uploads and LRC lyric
//! sheets into clean, non-overlapping SRT subtitles, and burns them into
//! lyric videos built from a still image and an audio track.

mod config;
mod config_file;
mod error;
mod ffmpeg;
mod http;
mod mux;
mod state;
mod storage;
mod subtitle;
mod transcribe;


use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "subtitle-forge";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("--generate-config") {
        let path = args.get(2).map(String::as_str).unwrap_or("config.toml");
        crate::config_file::generate_default_config(path)
            .map_err(|e| AppError::Config(format!("cannot write {}: {}", path, e)))?;
        println!("Wrote default configuration to {}", path);
        return Ok(());
    }

    // Load configuration
    let config_path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "config.toml".to_string());
    let (config, load_error) = if std::path::Path::new(&config_path).exists() {
        match crate::config_file::ConfigFile::from_file(&config_path) {
            Ok(cf) => (cf.into_server_config(), None),
            Err(e) => (ServerConfig::default(), Some(e.to_string())),
        }
    } else {
        (ServerConfig::default(), None)
    };

    // Initialize logging
    init_logging(&config.log_level, &config.log_format);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = load_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path,
            e
        );
    }
    tracing::info!("Configuration loaded: {:?}", config);

    // A failed init resurfaces as a probe error on the first upload
    match ffmpeg::init() {
        Ok(()) => tracing::info!("FFmpeg version: {}", ffmpeg::version_info()),
        Err(e) => tracing::warn!("{}", e),
    }

    // Create application state
    let state = Arc::new(AppState::new(config.clone()));
    state.storage.ensure_dirs().await?;

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid listen address {}: {}", config.socket_addr(), e)))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging(level: &str, format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("subtitle_forge={},tower_http=debug", level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
