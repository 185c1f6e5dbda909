//! Configuration file support
//!
//! Loads server configuration from TOML files. Every section except
//! `[server]` may be omitted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{MuxConfig, ServerConfig, StorageConfig, TranscribeConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Storage settings
    pub storage: Option<StorageSettings>,
    /// Transcription settings
    pub transcribe: Option<TranscribeSettings>,
    /// Muxing settings
    pub mux: Option<MuxSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
    /// Maximum upload body size in MB
    pub max_upload_mb: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub upload_dir: Option<PathBuf>,
    pub subtitle_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeSettings {
    /// Transcriber executable
    pub program: String,
    /// Arguments, `{input}` is replaced with the audio path
    pub args: Option<Vec<String>>,
    /// Timeout in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxSettings {
    pub ffmpeg_path: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub audio_bitrate: Option<String>,
    pub subtitle_style: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let storage = StorageConfig::default();
        let transcribe = TranscribeConfig::default();
        let mux = MuxConfig::default();
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 5000,
                cors_enabled: Some(true),
                max_upload_mb: Some(200),
            },
            storage: Some(StorageSettings {
                upload_dir: Some(storage.upload_dir),
                subtitle_dir: Some(storage.subtitle_dir),
                output_dir: Some(storage.output_dir),
            }),
            transcribe: Some(TranscribeSettings {
                program: transcribe.program,
                args: Some(transcribe.args),
                timeout_secs: Some(transcribe.timeout_secs),
            }),
            mux: Some(MuxSettings {
                ffmpeg_path: Some(mux.ffmpeg_path),
                video_codec: Some(mux.video_codec),
                audio_codec: Some(mux.audio_codec),
                audio_bitrate: Some(mux.audio_bitrate),
                subtitle_style: Some(mux.subtitle_style),
                timeout_secs: Some(mux.timeout_secs),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();

        let storage = match self.storage {
            Some(s) => StorageConfig {
                upload_dir: s.upload_dir.unwrap_or(defaults.storage.upload_dir),
                subtitle_dir: s.subtitle_dir.unwrap_or(defaults.storage.subtitle_dir),
                output_dir: s.output_dir.unwrap_or(defaults.storage.output_dir),
            },
            None => defaults.storage,
        };

        let transcribe = match self.transcribe {
            Some(t) => TranscribeConfig {
                program: t.program,
                args: t.args.unwrap_or(defaults.transcribe.args),
                timeout_secs: t.timeout_secs.unwrap_or(defaults.transcribe.timeout_secs),
            },
            None => defaults.transcribe,
        };

        let mux = match self.mux {
            Some(m) => MuxConfig {
                ffmpeg_path: m.ffmpeg_path.unwrap_or(defaults.mux.ffmpeg_path),
                video_codec: m.video_codec.unwrap_or(defaults.mux.video_codec),
                audio_codec: m.audio_codec.unwrap_or(defaults.mux.audio_codec),
                audio_bitrate: m.audio_bitrate.unwrap_or(defaults.mux.audio_bitrate),
                subtitle_style: m.subtitle_style.unwrap_or(defaults.mux.subtitle_style),
                timeout_secs: m.timeout_secs.unwrap_or(defaults.mux.timeout_secs),
            },
            None => defaults.mux,
        };

        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(defaults.log_format)),
            None => (defaults.log_level, defaults.log_format),
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            storage,
            transcribe,
            mux,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            max_upload_mb: self.server.max_upload_mb.unwrap_or(defaults.max_upload_mb),
            log_level,
            log_format,
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
