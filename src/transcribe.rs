//! Transcription adapter
//!
//! Speech-to-text is an external collaborator: given an audio file it
//! returns raw, approximately timed segments. The server holds one
//! `Transcriber` for its whole life and injects it into handlers through
//! `AppState`, so tests can swap in a fake.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::config::TranscribeConfig;
use crate::error::UpstreamAdapterError;
use crate::subtitle::RawSegment;

/// Anything that can turn an audio file into raw segments
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<RawSegment>, UpstreamAdapterError>;
}

/// Accepted stdout shapes: whisper-style `{"segments": [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptOutput {
    Wrapped { segments: Vec<RawSegment> },
    Bare(Vec<RawSegment>),
}

/// Parse transcriber stdout into raw segments
pub fn parse_transcript(stdout: &[u8]) -> Result<Vec<RawSegment>, UpstreamAdapterError> {
    let output: TranscriptOutput = serde_json::from_slice(stdout)
        .map_err(|e| UpstreamAdapterError::InvalidOutput(format!("transcript JSON: {}", e)))?;
    Ok(match output {
        TranscriptOutput::Wrapped { segments } => segments,
        TranscriptOutput::Bare(segments) => segments,
    })
}

/// Runs an external program that prints JSON segments on stdout
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    config: TranscribeConfig,
}

impl CommandTranscriber {
    pub fn new(config: TranscribeConfig) -> Self {
        Self { config }
    }

    /// Arguments with `{input}` substituted
    pub fn build_args(&self, audio: &Path) -> Vec<String> {
        let input = audio.to_string_lossy();
        self.config
            .args
            .iter()
            .map(|a| a.replace("{input}", &input))
            .collect()
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<RawSegment>, UpstreamAdapterError> {
        let args = self.build_args(audio);
        tracing::info!("Transcribing {:?} with {}", audio, self.config.program);

        let mut command = Command::new(&self.config.program);
        command.args(&args).stdin(Stdio::null()).kill_on_drop(true);

        // Dropping the output future on timeout kills the child.
        let limit = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(limit, command.output()).await {
            Ok(result) => result.map_err(|source| UpstreamAdapterError::Spawn {
                program: self.config.program.clone(),
                source,
            })?,
            Err(_) => {
                tracing::error!("{} timed out on {:?}", self.config.program, audio);
                return Err(UpstreamAdapterError::Transcription(format!(
                    "{} timed out after {}s",
                    self.config.program, self.config.timeout_secs
                )));
            }
        };

        if !output.status.success() {
            let diagnostic = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("{} failed ({}): {}", self.config.program, output.status, diagnostic);
            return Err(UpstreamAdapterError::Transcription(if diagnostic.is_empty() {
                format!("{} exited with {}", self.config.program, output.status)
            } else {
                diagnostic
            }));
        }

        let segments = parse_transcript(&output.stdout)?;
        tracing::info!("Transcription produced {} raw segment(s)", segments.len());
        Ok(segments)
    }
}
