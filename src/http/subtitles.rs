//! Subtitle endpoints
//!
//! Every path into the service (transcription, SRT upload, LRC import,
//! edited segments from the client) ends in the same place: normalize,
//! render SRT, optionally persist the artifact.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::handlers::HttpError;
use super::upload::{UploadForm, UploadedFile};
use crate::ffmpeg::probe_media;
use crate::state::{AppState, ArtifactKind};
use crate::storage::{file_stem, UploadKind};
use crate::subtitle::{parse_srt_with_report, RawSegment, Segment, SubtitleDocument};

/// Default name for client-edited subtitles
pub const DEFAULT_EDITED_FILENAME: &str = "edited_subtitles.srt";

#[derive(Debug, Serialize)]
pub struct SubtitlesResponse {
    pub segments: Vec<Segment>,
    pub srt_url: String,
}

#[derive(Debug, Serialize)]
pub struct SegmentsResponse {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
pub struct UploadFilesResponse {
    pub audio_filename: Option<String>,
    pub srt_filename: Option<String>,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub segments: Vec<RawSegment>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub srt_url: String,
    pub segments_written: usize,
    pub segments_dropped: usize,
}

/// Public URL of an SRT artifact
pub fn srt_url(filename: &str) -> String {
    format!("/download/{}", filename)
}

/// Parse an uploaded SRT, counting skipped blocks
pub(crate) fn document_from_srt(state: &AppState, text: &str) -> SubtitleDocument {
    let report = parse_srt_with_report(text);
    if !report.skipped.is_empty() {
        state
            .stats
            .srt_blocks_skipped
            .fetch_add(report.skipped.len() as u64, Ordering::Relaxed);
    }
    let doc = SubtitleDocument::from_raw(&report.segments);
    state.stats.record_document(&doc);
    doc
}

pub(crate) fn document_from_raw(state: &AppState, raw: &[RawSegment]) -> SubtitleDocument {
    let doc = SubtitleDocument::from_raw(raw);
    state.stats.record_document(&doc);
    doc
}

/// Write a document to the subtitle directory and register it
pub(crate) async fn persist_document(
    state: &AppState,
    filename: &str,
    doc: &SubtitleDocument,
) -> Result<String, HttpError> {
    if doc.is_empty() {
        tracing::warn!("No usable segments; writing empty subtitle file for {:?}", filename);
    }
    let name = state.storage.write_subtitle(filename, &doc.srt).await?;
    state.register_artifact(ArtifactKind::Subtitle, &name, doc.segments.len());
    Ok(name)
}

/// Store an uploaded media file, probe it and run it through the transcriber.
///
/// Returns the raw segments and the stored path; the caller decides whether
/// the upload is kept.
async fn transcribe_upload(
    state: &Arc<AppState>,
    file: &UploadedFile,
) -> Result<(Vec<RawSegment>, PathBuf), HttpError> {
    let path = state.storage.save_upload(&file.filename, &file.data).await?;

    let audio = path.clone();
    let probed = tokio::task::spawn_blocking(move || -> crate::error::Result<f64> {
        let probe = probe_media(&audio)?;
        probe.require_audio()?;
        Ok(probe.duration_secs)
    })
    .await;

    let result = match probed {
        Ok(Ok(duration)) => {
            tracing::debug!("Transcribing {:?} ({:.1}s)", path, duration);
            state
                .transcriber
                .transcribe(&path)
                .await
                .map_err(crate::error::AppError::from)
        }
        Ok(Err(e)) => Err(e),
        Err(e) => {
            state.storage.remove(&path).await;
            return Err(e.into());
        }
    };

    match result {
        Ok(raw) => {
            state.stats.transcriptions.fetch_add(1, Ordering::Relaxed);
            tracing::info!("Transcribed {:?}: {} raw segment(s)", file.filename, raw.len());
            Ok((raw, path))
        }
        Err(e) => {
            if matches!(e, crate::error::AppError::Upstream(_)) {
                state
                    .stats
                    .transcription_failures
                    .fetch_add(1, Ordering::Relaxed);
                tracing::error!("Transcription of {:?} failed: {}", file.filename, e);
            }
            state.storage.remove(&path).await;
            Err(e.into())
        }
    }
}

fn require_field(form: &mut UploadForm, names: &[&str], what: &str) -> Result<UploadedFile, HttpError> {
    form.take(names)
        .ok_or_else(|| HttpError::BadRequest(format!("No {} file provided", what)))
}

/// Transcribe an audio upload into an SRT artifact
/// POST /generate-subtitles
pub async fn generate_subtitles(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SubtitlesResponse>, HttpError> {
    let mut form = UploadForm::collect(multipart).await?;
    let audio = require_field(&mut form, &["audio"], "audio")?;
    audio.expect_kind(&[UploadKind::Media], "Unsupported audio format")?;

    let (raw, path) = transcribe_upload(&state, &audio).await?;
    state.storage.remove(&path).await;

    let doc = document_from_raw(&state, &raw);
    let name = persist_document(&state, &format!("{}.srt", file_stem(&audio.filename)), &doc).await?;

    Ok(Json(SubtitlesResponse {
        segments: doc.segments,
        srt_url: srt_url(&name),
    }))
}

/// Turn any supported upload (SRT, LRC or media) into an SRT artifact
/// POST /process-subtitles
pub async fn process_subtitles(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SubtitlesResponse>, HttpError> {
    let mut form = UploadForm::collect(multipart).await?;
    let file = require_field(&mut form, &["file"], "subtitle or media")?;
    let kind = file.expect_kind(
        &[UploadKind::Subtitle, UploadKind::Lyrics, UploadKind::Media],
        "Unsupported file type",
    )?;

    let doc = match kind {
        UploadKind::Subtitle => document_from_srt(&state, &file.text()),
        UploadKind::Lyrics => {
            let doc = SubtitleDocument::from_lrc(&file.text());
            state.stats.record_document(&doc);
            doc
        }
        _ => {
            let (raw, path) = transcribe_upload(&state, &file).await?;
            state.storage.remove(&path).await;
            document_from_raw(&state, &raw)
        }
    };

    let name = persist_document(&state, &format!("{}.srt", file_stem(&file.filename)), &doc).await?;

    Ok(Json(SubtitlesResponse {
        segments: doc.segments,
        srt_url: srt_url(&name),
    }))
}

/// Parse an SRT upload for editing; nothing is stored
/// POST /upload-srt
pub async fn upload_srt(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SegmentsResponse>, HttpError> {
    let mut form = UploadForm::collect(multipart).await?;
    let srt = require_field(&mut form, &["srt"], "SRT")?;
    srt.expect_kind(&[UploadKind::Subtitle], "Expected an .srt file")?;

    let doc = document_from_srt(&state, &srt.text());
    Ok(Json(SegmentsResponse {
        segments: doc.segments,
    }))
}

/// Upload audio and/or SRT. An SRT, when present, is used as-is;
/// otherwise the audio is transcribed. The audio upload is kept.
/// POST /upload-files
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadFilesResponse>, HttpError> {
    let mut form = UploadForm::collect(multipart).await?;
    let audio = form.take(&["audio"]);
    let srt = form.take(&["srt"]);

    if let Some(a) = &audio {
        a.expect_kind(&[UploadKind::Media], "Unsupported audio format")?;
    }
    if let Some(s) = &srt {
        s.expect_kind(&[UploadKind::Subtitle], "Expected an .srt file")?;
    }

    let (doc, audio_path) = if let Some(s) = &srt {
        let stored = match &audio {
            Some(a) => Some(state.storage.save_upload(&a.filename, &a.data).await?),
            None => None,
        };
        (document_from_srt(&state, &s.text()), stored)
    } else if let Some(a) = &audio {
        let (raw, path) = transcribe_upload(&state, a).await?;
        (document_from_raw(&state, &raw), Some(path))
    } else {
        return Err(HttpError::BadRequest(
            "Provide an audio file, an SRT file or both".to_string(),
        ));
    };

    let base = srt
        .as_ref()
        .or(audio.as_ref())
        .map(|f| file_stem(&f.filename).to_string())
        .unwrap_or_default();
    let srt_filename = persist_document(&state, &format!("{}.srt", base), &doc).await?;

    Ok(Json(UploadFilesResponse {
        audio_filename: audio_path
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string())),
        srt_filename: Some(srt_filename),
        segments: doc.segments,
    }))
}

/// Normalize client-edited segments and store them as SRT
/// POST /save-subtitles
pub async fn save_subtitles(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, HttpError> {
    let filename = request
        .filename
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(DEFAULT_EDITED_FILENAME);

    let doc = document_from_raw(&state, &request.segments);
    let name = persist_document(&state, filename, &doc).await?;

    Ok(Json(SaveResponse {
        srt_url: srt_url(&name),
        segments_written: doc.segments.len(),
        segments_dropped: doc.dropped,
    }))
}
