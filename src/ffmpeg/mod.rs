//! FFmpeg module - library initialization and media probing
//!
//! The muxing itself is done by the ffmpeg command-line tool (see
//! `crate::mux`); the library is only used to check uploads before they
//! are handed to the external adapters.

pub mod probe;

pub use ffmpeg_next as ffmpeg;
pub use probe::{probe_media, MediaProbe};

/// Initialize FFmpeg library
///
/// This should be called once at application startup.
/// Returns an error if FFmpeg fails to initialize.
pub fn init() -> Result<(), crate::error::FfmpegError> {
    ffmpeg::init().map_err(|e| {
        crate::error::FfmpegError::InitFailed(format!("ffmpeg::init() failed: {}", e))
    })?;

    // Demuxer chatter on every probe is noise; keep warnings and up.
    ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Warning);

    tracing::info!("FFmpeg initialized");

    Ok(())
}

/// Get FFmpeg version information
pub fn version_info() -> String {
    let v = ffmpeg::util::version();
    format!("libavutil {}.{}.{}", v >> 16, (v >> 8) & 0xff, v & 0xff)
}
