//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Uploaded media and images
    pub upload_dir: PathBuf,

    /// Generated and saved SRT files
    pub subtitle_dir: PathBuf,

    /// Muxed videos
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            subtitle_dir: PathBuf::from("subtitles"),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

/// Transcription adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeConfig {
    /// Program that transcribes one audio file and prints JSON segments on stdout
    pub program: String,

    /// Arguments; `{input}` is replaced with the audio path
    pub args: Vec<String>,

    /// Kill the transcriber after this many seconds
    pub timeout_secs: u64,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            program: "whisper-json".to_string(),
            args: vec!["{input}".to_string()],
            timeout_secs: 600,
        }
    }
}

/// Video muxing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxConfig {
    /// Path to the ffmpeg binary
    pub ffmpeg_path: String,

    /// Video encoder for the still-image track
    pub video_codec: String,

    /// Audio encoder
    pub audio_codec: String,

    /// Audio bitrate (ffmpeg syntax, e.g. "299k")
    pub audio_bitrate: String,

    /// ASS force_style applied when burning subtitles
    pub subtitle_style: String,

    /// Kill ffmpeg after this many seconds
    pub timeout_secs: u64,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "299k".to_string(),
            subtitle_style: "FontSize=36,Alignment=2".to_string(),
            timeout_secs: 600,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Storage directories
    pub storage: StorageConfig,

    /// Transcription adapter
    pub transcribe: TranscribeConfig,

    /// Muxing adapter
    pub mux: MuxConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Maximum upload body size in megabytes
    pub max_upload_mb: usize,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            storage: StorageConfig::default(),
            transcribe: TranscribeConfig::default(),
            mux: MuxConfig::default(),
            cors_enabled: true,
            max_upload_mb: 200,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
