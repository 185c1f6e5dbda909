//! Muxing adapter
//!
//! Composes a video from a still image, an audio track and optionally an
//! SRT file burned into the picture. The encoding is done by the ffmpeg
//! command-line tool; on failure its diagnostic text is passed through
//! untouched.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::MuxConfig;
use crate::error::UpstreamAdapterError;

/// Inputs for one muxing job
#[derive(Debug, Clone)]
pub struct MuxRequest {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub subtitles: Option<PathBuf>,
    pub output: PathBuf,
}

/// Anything that can produce a video from image + audio + optional subtitles
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn mux(&self, request: &MuxRequest) -> Result<PathBuf, UpstreamAdapterError>;
}

/// Muxer backed by the ffmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    config: MuxConfig,
}

impl FfmpegMuxer {
    pub fn new(config: MuxConfig) -> Self {
        Self { config }
    }

    /// Full ffmpeg argument list for a request
    pub fn build_args(&self, request: &MuxRequest) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-loop".into(),
            "1".into(),
            "-i".into(),
            path_arg(&request.image),
            "-i".into(),
            path_arg(&request.audio),
            "-c:v".into(),
            self.config.video_codec.clone(),
            "-c:a".into(),
            self.config.audio_codec.clone(),
            "-b:a".into(),
            self.config.audio_bitrate.clone(),
            "-shortest".into(),
        ];

        if let Some(subs) = &request.subtitles {
            args.push("-vf".into());
            args.push(format!(
                "subtitles={}:force_style='{}'",
                escape_filter_path(subs),
                self.config.subtitle_style
            ));
        }

        args.push(path_arg(&request.output));
        args
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(&self, request: &MuxRequest) -> Result<PathBuf, UpstreamAdapterError> {
        let args = self.build_args(request);
        tracing::info!(
            "Muxing {:?} + {:?} (subtitles: {:?}) -> {:?}",
            request.image,
            request.audio,
            request.subtitles,
            request.output
        );
        tracing::debug!("{} {}", self.config.ffmpeg_path, args.join(" "));

        let mut command = Command::new(&self.config.ffmpeg_path);
        command.args(&args).stdin(Stdio::null()).kill_on_drop(true);

        let limit = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(limit, command.output()).await {
            Ok(result) => result.map_err(|source| UpstreamAdapterError::Spawn {
                program: self.config.ffmpeg_path.clone(),
                source,
            })?,
            Err(_) => {
                tracing::error!("ffmpeg timed out writing {:?}", request.output);
                return Err(UpstreamAdapterError::Muxing(format!(
                    "ffmpeg timed out after {}s",
                    self.config.timeout_secs
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            tracing::error!("ffmpeg failed with {}", output.status);
            return Err(UpstreamAdapterError::Muxing(if stderr.trim().is_empty() {
                format!("ffmpeg exited with {}", output.status)
            } else {
                stderr
            }));
        }

        Ok(request.output.clone())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Escape a path for use inside an ffmpeg filter argument
fn escape_filter_path(path: &Path) -> String {
    let mut out = String::new();
    for c in path.to_string_lossy().chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | '[' | ']' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
