//! Video muxing and file downloads

use axum::{
    body::Body,
    extract::{Multipart, Path as AxumPath, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::handlers::HttpError;
use super::subtitles::{document_from_srt, persist_document};
use super::upload::{UploadForm, UploadedFile};
use crate::ffmpeg::probe_media;
use crate::mux::MuxRequest;
use crate::state::{AppState, ArtifactKind};
use crate::storage::{extension, file_stem, UploadKind};
use crate::subtitle::SubtitleDocument;

#[derive(Debug, Serialize)]
pub struct MuxResponse {
    pub message: String,
    pub output_url: String,
}

/// Compose a video from an image, an audio track and optional subtitles
/// POST /upload
pub async fn upload_and_mux(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<MuxResponse>, HttpError> {
    let mut form = UploadForm::collect(multipart).await?;

    let (Some(audio), Some(image)) = (form.take(&["audio"]), form.take(&["image"])) else {
        return Err(HttpError::BadRequest(
            "Both an audio file and an image are required".to_string(),
        ));
    };
    audio.expect_kind(&[UploadKind::Media], "Unsupported audio format")?;
    image.expect_kind(&[UploadKind::Image], "Unsupported image format")?;

    // LRC is converted to SRT up front; SRT is re-normalized
    let subtitles = match form.take(&["srt", "subtitle"]) {
        Some(file) => {
            let kind = file.expect_kind(
                &[UploadKind::Subtitle, UploadKind::Lyrics],
                "Subtitles must be .srt or .lrc",
            )?;
            let doc = match kind {
                UploadKind::Lyrics => {
                    let doc = SubtitleDocument::from_lrc(&file.text());
                    state.stats.record_document(&doc);
                    doc
                }
                _ => document_from_srt(&state, &file.text()),
            };
            let name = persist_document(&state, &format!("{}.srt", file_stem(&file.filename)), &doc)
                .await?;
            Some((name, doc.segments.len()))
        }
        None => None,
    };

    let output_path = state.storage.new_output_path();
    let mut saved = Vec::new();
    let result = mux_uploads(
        &state,
        &audio,
        &image,
        subtitles
            .as_ref()
            .map(|(name, _)| state.storage.subtitle_dir().join(name)),
        output_path.clone(),
        &mut saved,
    )
    .await;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if let HttpError::Upstream(msg) = &e {
                state.stats.mux_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Muxing failed: {}", msg);
            }
            for path in &saved {
                state.storage.remove(path).await;
            }
            if tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
                state.storage.remove(&output_path).await;
            }
            if let Some((name, _)) = &subtitles {
                state.storage.remove(&state.storage.subtitle_dir().join(name)).await;
                state.artifacts.remove(name);
            }
            return Err(e);
        }
    };

    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| HttpError::InternalError(format!("Invalid output path {:?}", output)))?;

    state.stats.videos_muxed.fetch_add(1, Ordering::Relaxed);
    state.register_artifact(
        ArtifactKind::Video,
        &name,
        subtitles.map(|(_, n)| n).unwrap_or(0),
    );
    tracing::info!("Video generated: {}", name);

    Ok(Json(MuxResponse {
        message: "Video generated successfully".to_string(),
        output_url: format!("/download-video/{}", name),
    }))
}

/// Store both uploads, check them with ffmpeg and run the muxer.
///
/// Every stored path is pushed onto `saved` so the caller can discard
/// them when the job fails.
async fn mux_uploads(
    state: &AppState,
    audio: &UploadedFile,
    image: &UploadedFile,
    subtitles: Option<PathBuf>,
    output: PathBuf,
    saved: &mut Vec<PathBuf>,
) -> Result<PathBuf, HttpError> {
    let audio_path = state.storage.save_upload(&audio.filename, &audio.data).await?;
    saved.push(audio_path.clone());
    let image_path = state.storage.save_upload(&image.filename, &image.data).await?;
    saved.push(image_path.clone());

    let request = MuxRequest {
        image: image_path,
        audio: audio_path,
        subtitles,
        output,
    };

    let (audio_in, image_in) = (request.audio.clone(), request.image.clone());
    tokio::task::spawn_blocking(move || -> crate::error::Result<()> {
        probe_media(&audio_in)?.require_audio()?;
        probe_media(&image_in)?.require_video()?;
        Ok(())
    })
    .await??;

    Ok(state.muxer.mux(&request).await.map_err(crate::error::AppError::from)?)
}

/// MIME type by file extension
pub fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("srt") => "application/x-subrip",
        Some("lrc") => "text/plain; charset=utf-8",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn file_response(filename: &str, data: Vec<u8>, attachment: bool) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(filename)),
    );
    if attachment {
        // Names reaching here passed sanitize_filename, so they are valid header text
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    (headers, Body::from(data)).into_response()
}

/// GET /download/{filename}
pub async fn download_subtitle(
    State(state): State<Arc<AppState>>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, HttpError> {
    let data = state.storage.read(state.storage.subtitle_dir(), &filename).await?;
    Ok(file_response(&filename, data, true))
}

/// GET /download-video/{filename}
pub async fn download_video(
    State(state): State<Arc<AppState>>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, HttpError> {
    let data = state.storage.read(state.storage.output_dir(), &filename).await?;
    Ok(file_response(&filename, data, true))
}

/// GET /download-audio/{filename}
pub async fn download_audio(
    State(state): State<Arc<AppState>>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, HttpError> {
    let data = state.storage.read(state.storage.upload_dir(), &filename).await?;
    Ok(file_response(&filename, data, true))
}

/// GET /uploads/{filename}
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, HttpError> {
    let data = state.storage.read(state.storage.upload_dir(), &filename).await?;
    Ok(file_response(&filename, data, false))
}
