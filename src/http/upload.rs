//! Multipart form collection

use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;

use super::handlers::HttpError;
use crate::storage::{sanitize_filename, UploadKind};

/// One file field of a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Sanitized client filename
    pub filename: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn kind(&self) -> Option<UploadKind> {
        UploadKind::from_filename(&self.filename)
    }

    /// Content decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Fail with `message` unless the file is one of `allowed`
    pub fn expect_kind(&self, allowed: &[UploadKind], message: &str) -> Result<UploadKind, HttpError> {
        match self.kind() {
            Some(kind) if allowed.contains(&kind) => Ok(kind),
            _ => Err(HttpError::BadRequest(format!("{}: {}", message, self.filename))),
        }
    }
}

/// File fields of a multipart request, by field name
#[derive(Debug, Default)]
pub struct UploadForm {
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    /// Read every field. Fields without a filename, or with an empty one, are ignored.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, HttpError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| HttpError::BadRequest(format!("Malformed upload: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let filename = field.file_name().map(sanitize_filename).unwrap_or_default();
            let data = field
                .bytes()
                .await
                .map_err(|e| HttpError::BadRequest(format!("Malformed upload: {}", e)))?;

            if filename.is_empty() {
                tracing::debug!("Ignoring multipart field {:?} without a filename", name);
                continue;
            }

            tracing::debug!("Received {:?} as field {:?} ({} bytes)", filename, name, data.len());
            form.files.insert(name, UploadedFile { filename, data });
        }

        Ok(form)
    }

    /// Take the first present field among `names`
    pub fn take(&mut self, names: &[&str]) -> Option<UploadedFile> {
        names.iter().find_map(|n| self.files.remove(*n))
    }
}
