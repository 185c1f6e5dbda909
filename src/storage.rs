//! Artifact storage
//!
//! Three flat directories: uploads, subtitles and muxed videos. Every name
//! that reaches the filesystem goes through `sanitize_filename`, and
//! lookups refuse names that would leave their directory.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};

/// Media containers accepted for transcription
pub const MEDIA_EXTENSIONS: &[&str] = &["wav", "mp3", "mp4", "m4a"];

/// Still images accepted for video muxing
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Kind of uploaded file, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Media,
    Subtitle,
    Lyrics,
    Image,
}

impl UploadKind {
    /// Classify a filename by its (case-insensitive) extension
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = extension(name)?;
        if MEDIA_EXTENSIONS.contains(&ext.as_str()) {
            Some(UploadKind::Media)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(UploadKind::Image)
        } else if ext == "srt" {
            Some(UploadKind::Subtitle)
        } else if ext == "lrc" {
            Some(UploadKind::Lyrics)
        } else {
            None
        }
    }
}

/// Lowercased extension of a filename, without the dot
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Reduce a client-supplied filename to a safe basename.
///
/// Keeps ASCII alphanumerics, `-`, `_` and `.`; whitespace becomes `_`;
/// directory components and leading dots are removed. Returns an empty
/// string when nothing usable is left.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    cleaned.trim_start_matches(&['.', '_'][..]).to_string()
}

/// Filename without its extension
pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Storage rooted in the configured directories
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Create all directories
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.config.upload_dir,
            &self.config.subtitle_dir,
            &self.config.output_dir,
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_dir
    }

    pub fn subtitle_dir(&self) -> &Path {
        &self.config.subtitle_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Store an upload under a fresh unique name, keeping its extension
    pub async fn save_upload(&self, original_name: &str, data: &[u8]) -> Result<PathBuf> {
        let name = match extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.config.upload_dir.join(name);
        tokio::fs::write(&path, data).await?;
        tracing::debug!("Stored upload {:?} as {:?}", original_name, path);
        Ok(path)
    }

    /// Write an SRT artifact. Returns the sanitized filename actually used.
    pub async fn write_subtitle(&self, filename: &str, content: &str) -> Result<String> {
        let mut name = sanitize_filename(filename);
        if name.is_empty() {
            return Err(AppError::BadRequest(format!(
                "invalid subtitle filename {:?}",
                filename
            )));
        }
        if extension(&name).as_deref() != Some("srt") {
            name.push_str(".srt");
        }
        let path = self.config.subtitle_dir.join(&name);
        tokio::fs::write(&path, content.as_bytes()).await?;
        tracing::info!("Wrote subtitle file {:?} ({} bytes)", path, content.len());
        Ok(name)
    }

    /// Fresh path for a muxed video
    pub fn new_output_path(&self) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}.mp4", Uuid::new_v4()))
    }

    /// Resolve a requested name inside `dir`, refusing anything that is not a plain basename
    pub fn resolve(&self, dir: &Path, filename: &str) -> Result<PathBuf> {
        if filename.is_empty()
            || sanitize_filename(filename) != filename
            || filename.contains("..")
        {
            return Err(AppError::NotFound(filename.to_string()));
        }
        Ok(dir.join(filename))
    }

    /// Read a stored file
    pub async fn read(&self, dir: &Path, filename: &str) -> Result<Vec<u8>> {
        let path = self.resolve(dir, filename)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of a temporary upload
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove {:?}: {}", path, e);
        }
    }
}
