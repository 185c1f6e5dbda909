//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration
//! - Storage directories
//! - The injected transcription and muxing adapters
//! - Pipeline counters and the registry of produced artifacts

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::mux::{FfmpegMuxer, Muxer};
use crate::storage::Storage;
use crate::subtitle::SubtitleDocument;
use crate::transcribe::{CommandTranscriber, Transcriber};

/// Kind of file the server produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Subtitle,
    Video,
}

/// A produced file
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    /// Number of cues for subtitles, cues burned in for videos
    pub segments: usize,
}

/// Counters over the lifetime of the process
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub documents_rendered: AtomicU64,
    pub segments_written: AtomicU64,
    pub segments_dropped: AtomicU64,
    pub srt_blocks_skipped: AtomicU64,
    pub transcriptions: AtomicU64,
    pub transcription_failures: AtomicU64,
    pub videos_muxed: AtomicU64,
    pub mux_failures: AtomicU64,
}

/// Point-in-time copy of `PipelineStats`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub documents_rendered: u64,
    pub segments_written: u64,
    pub segments_dropped: u64,
    pub srt_blocks_skipped: u64,
    pub transcriptions: u64,
    pub transcription_failures: u64,
    pub videos_muxed: u64,
    pub mux_failures: u64,
}

impl PipelineStats {
    /// Account for one rendered document
    pub fn record_document(&self, doc: &SubtitleDocument) {
        self.documents_rendered.fetch_add(1, Ordering::Relaxed);
        self.segments_written
            .fetch_add(doc.segments.len() as u64, Ordering::Relaxed);
        self.segments_dropped
            .fetch_add(doc.dropped as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            documents_rendered: self.documents_rendered.load(Ordering::Relaxed),
            segments_written: self.segments_written.load(Ordering::Relaxed),
            segments_dropped: self.segments_dropped.load(Ordering::Relaxed),
            srt_blocks_skipped: self.srt_blocks_skipped.load(Ordering::Relaxed),
            transcriptions: self.transcriptions.load(Ordering::Relaxed),
            transcription_failures: self.transcription_failures.load(Ordering::Relaxed),
            videos_muxed: self.videos_muxed.load(Ordering::Relaxed),
            mux_failures: self.mux_failures.load(Ordering::Relaxed),
        }
    }
}

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Upload / subtitle / output directories
    pub storage: Storage,

    /// Speech-to-text adapter
    pub transcriber: Arc<dyn Transcriber>,

    /// Video muxing adapter
    pub muxer: Arc<dyn Muxer>,

    /// Pipeline counters
    pub stats: PipelineStats,

    /// Produced files (filename -> record)
    pub artifacts: DashMap<String, ArtifactRecord>,
}

impl AppState {
    /// Create a new AppState with the command-line adapters from the configuration
    pub fn new(config: ServerConfig) -> Self {
        let transcriber = Arc::new(CommandTranscriber::new(config.transcribe.clone()));
        let muxer = Arc::new(FfmpegMuxer::new(config.mux.clone()));
        Self::with_adapters(config, transcriber, muxer)
    }

    /// Create an AppState with explicitly injected adapters
    pub fn with_adapters(
        config: ServerConfig,
        transcriber: Arc<dyn Transcriber>,
        muxer: Arc<dyn Muxer>,
    ) -> Self {
        Self {
            storage: Storage::new(config.storage.clone()),
            config,
            transcriber,
            muxer,
            stats: PipelineStats::default(),
            artifacts: DashMap::new(),
        }
    }

    /// Remember a produced file
    pub fn register_artifact(&self, kind: ArtifactKind, filename: &str, segments: usize) {
        self.artifacts.insert(
            filename.to_string(),
            ArtifactRecord {
                kind,
                filename: filename.to_string(),
                created_at: Utc::now(),
                segments,
            },
        );
    }

    /// All produced files, newest first
    pub fn list_artifacts(&self) -> Vec<ArtifactRecord> {
        let mut records: Vec<ArtifactRecord> =
            self.artifacts.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}
