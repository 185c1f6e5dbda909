//! Test fixtures for integration tests
//!
//! Tiny but real media files (so the ffmpeg probe accepts them), canned
//! subtitle text, fake adapters and a multipart body builder.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use tempfile::TempDir;

use crate::config::{ServerConfig, StorageConfig};
use crate::error::UpstreamAdapterError;
use crate::http::create_router;
use crate::mux::{MuxRequest, Muxer};
use crate::state::AppState;
use crate::subtitle::RawSegment;
use crate::transcribe::Transcriber;

/// Three cues, the middle one with a broken timing line
pub const MALFORMED_SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n\
2\n00:00:02.000 --> 00:00:03.000\nTwo\n\n\
3\n00:00:03,000 --> 00:00:04,000\nThree\n";

pub const SAMPLE_LRC: &str = "[ar:Someone]\n[00:10.50]Hello\n[00:16.00]World\n";

/// SRT produced from `SAMPLE_LRC`
pub const SAMPLE_LRC_AS_SRT: &str =
    "1\n00:00:09,500 --> 00:00:16,000\nHello\n\n2\n00:00:16,000 --> 00:00:24,000\nWorld";

/// 1x1 RGBA PNG
pub const PNG_1X1: [u8; 70] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64, 0x60, 0xf8, 0x5f,
    0x0f, 0x00, 0x02, 0x87, 0x01, 0x80, 0xeb, 0x47, 0xba, 0x92, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Silent 8 kHz mono 16-bit PCM WAV
pub fn wav_bytes(duration_ms: u32) -> Vec<u8> {
    let sample_rate: u32 = 8000;
    let data_len = sample_rate * 2 * duration_ms / 1000;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

/// Transcriber returning a canned result
pub struct FakeTranscriber {
    result: Result<Vec<RawSegment>, String>,
    pub calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn returning(segments: Vec<RawSegment>) -> Self {
        Self {
            result: Ok(segments),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &std::path::Path) -> Result<Vec<RawSegment>, UpstreamAdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .map_err(UpstreamAdapterError::Transcription)
    }
}

/// Muxer that writes a placeholder file, or leaves a truncated one behind
/// and fails with a fixed diagnostic
#[derive(Default)]
pub struct FakeMuxer {
    fail_with: Option<String>,
    pub requests: Mutex<Vec<MuxRequest>>,
}

impl FakeMuxer {
    pub fn failing(diagnostic: &str) -> Self {
        Self {
            fail_with: Some(diagnostic.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

pub const FAKE_VIDEO: &[u8] = b"not really an mp4";

#[async_trait]
impl Muxer for FakeMuxer {
    async fn mux(&self, request: &MuxRequest) -> Result<PathBuf, UpstreamAdapterError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(diagnostic) = &self.fail_with {
            let _ = tokio::fs::write(&request.output, &FAKE_VIDEO[..4]).await;
            return Err(UpstreamAdapterError::Muxing(diagnostic.clone()));
        }
        tokio::fs::write(&request.output, FAKE_VIDEO)
            .await
            .map_err(|e| UpstreamAdapterError::Muxing(e.to_string()))?;
        Ok(request.output.clone())
    }
}

/// A router over temporary directories
pub struct TestApp {
    pub dir: TempDir,
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    pub async fn new(transcriber: Arc<dyn Transcriber>, muxer: Arc<dyn Muxer>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            storage: StorageConfig {
                upload_dir: dir.path().join("uploads"),
                subtitle_dir: dir.path().join("subtitles"),
                output_dir: dir.path().join("outputs"),
            },
            ..Default::default()
        };
        let state = Arc::new(AppState::with_adapters(config, transcriber, muxer));
        state.storage.ensure_dirs().await.unwrap();
        let router = create_router(state.clone());
        Self { dir, state, router }
    }

    pub async fn with_defaults() -> Self {
        Self::new(
            Arc::new(FakeTranscriber::returning(Vec::new())),
            Arc::new(FakeMuxer::default()),
        )
        .await
    }

    /// Number of files currently in the upload directory
    pub fn upload_count(&self) -> usize {
        count_files(self.state.storage.upload_dir())
    }

    pub fn subtitle_count(&self) -> usize {
        count_files(self.state.storage.subtitle_dir())
    }

    pub fn output_count(&self) -> usize {
        count_files(self.state.storage.output_dir())
    }
}

fn count_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// Hand-built multipart/form-data body
pub struct MultipartBody {
    boundary: &'static str,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "subtitle-forge-test-boundary",
            body: Vec::new(),
        }
    }

    pub fn file(mut self, field: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                self.boundary, field, filename
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (self.content_type(), self.body)
    }
}
