//! Media probing
//!
//! Opens an uploaded file with libavformat and reports what it contains.
//! Used to reject uploads the transcriber or muxer could never handle.

use std::path::Path;

use ffmpeg_next as ffmpeg;

use crate::error::{FfmpegError, Result};

/// What a media file contains
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    /// Container duration in seconds (0 when unknown, e.g. still images)
    pub duration_secs: f64,
    pub has_audio: bool,
    pub has_video: bool,
}

impl MediaProbe {
    /// Fail unless the file has at least one audio stream
    pub fn require_audio(&self) -> std::result::Result<(), FfmpegError> {
        if self.has_audio {
            Ok(())
        } else {
            Err(FfmpegError::MissingStream("audio"))
        }
    }

    /// Fail unless the file decodes as a picture or video stream
    pub fn require_video(&self) -> std::result::Result<(), FfmpegError> {
        if self.has_video {
            Ok(())
        } else {
            Err(FfmpegError::MissingStream("video"))
        }
    }
}

/// Probe a media file.
///
/// Blocking: call from `spawn_blocking` in async contexts.
pub fn probe_media<P: AsRef<Path>>(path: P) -> Result<MediaProbe> {
    let path = path.as_ref();

    // Initialize FFmpeg if not already done
    ffmpeg::init().map_err(|e| FfmpegError::InitFailed(format!("ffmpeg::init() failed: {}", e)))?;

    let context = ffmpeg::format::input(&path)
        .map_err(|e| FfmpegError::OpenInput(format!("Failed to open {:?}: {}", path, e)))?;

    let duration = context.duration();
    let mut probe = MediaProbe {
        duration_secs: if duration > 0 {
            duration as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        },
        has_audio: false,
        has_video: false,
    };

    for stream in context.streams() {
        match stream.parameters().medium() {
            ffmpeg::media::Type::Audio => probe.has_audio = true,
            ffmpeg::media::Type::Video => probe.has_video = true,
            other => tracing::debug!("Ignoring stream {} (type={:?})", stream.index(), other),
        }
    }

    tracing::debug!("Probed {:?}: {:?}", path, probe);

    Ok(probe)
}
