use thiserror::Error;

/// Main error type for the subtitle server
#[derive(Error, Debug)]
pub enum AppError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream adapter error: {0}")]
    Upstream(#[from] UpstreamAdapterError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// A single malformed timestamp.
///
/// Recoverable: callers substitute `0.0` and keep processing the rest of
/// the sequence.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed timestamp {input:?}: {reason}")]
pub struct TimeParseError {
    pub input: String,
    pub reason: &'static str,
}

impl TimeParseError {
    pub fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }
}

/// A malformed SRT block. The parser skips the block and continues.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("skipped SRT block #{block}: {reason}")]
pub struct BlockParseError {
    /// 1-based ordinal of the block in the source text
    pub block: usize,
    pub reason: String,
}

/// Failures of the external transcription and muxing collaborators.
/// Fatal to the current request, never retried here.
#[derive(Error, Debug)]
pub enum UpstreamAdapterError {
    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("{0}")]
    Muxing(String),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Adapter produced invalid output: {0}")]
    InvalidOutput(String),
}

/// FFmpeg-specific errors
#[derive(Error, Debug)]
pub enum FfmpegError {
    #[error("FFmpeg initialization failed: {0}")]
    InitFailed(String),

    #[error("Failed to open input file: {0}")]
    OpenInput(String),

    #[error("No {0} stream found")]
    MissingStream(&'static str),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
