//! Multipart form reading and upload persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::info;

use crate::error::ApiError;

/// The `file` part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A fully read multipart form: the `file` part plus any text fields.
#[derive(Debug, Default)]
pub struct FormParts {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl FormParts {
    pub fn require_file(self) -> Result<UploadedFile, ApiError> {
        self.file
            .ok_or_else(|| ApiError::bad_request("multipart field 'file' is required"))
    }

    /// A text field, trimmed; `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

pub async fn read_form(mut multipart: Multipart) -> Result<FormParts, ApiError> {
    let mut form = FormParts::default();
    while let Some(field) = multipart.next_field().await.map_err(ApiError::bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(ApiError::bad_request)?;
            form.file = Some(UploadedFile {
                filename,
                content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(ApiError::bad_request)?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

/// Keep the final path component and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "audio".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Unique on-disk name for an upload.
fn stored_filename(original: Option<&str>) -> String {
    let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let id = uuid::Uuid::new_v4().simple().to_string();
    let name = sanitize_filename(original.unwrap_or("audio"));
    format!("{ts}_{}_{name}", &id[..8])
}

/// Write an upload under `dir`, returning the stored path.
pub async fn save_upload(dir: &Path, file: &UploadedFile) -> Result<PathBuf, ApiError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(ApiError::internal)?;
    let path = dir.join(stored_filename(file.filename.as_deref()));
    tokio::fs::write(&path, &file.data)
        .await
        .map_err(ApiError::internal)?;

    info!(path = %path.display(), bytes = file.data.len(), "Saved upload");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\tmp\\clip.wav"), "clip.wav");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_filename("my clip (1).webm"), "my_clip__1_.webm");
        assert_eq!(sanitize_filename("..."), "audio");
        assert_eq!(sanitize_filename(""), "audio");
    }

    #[test]
    fn test_stored_filename_keeps_original_suffix() {
        let name = stored_filename(Some("rec.wav"));
        assert!(name.ends_with("_rec.wav"));
        assert_ne!(name, stored_filename(Some("rec.wav")));
    }

    #[tokio::test]
    async fn test_save_upload_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = UploadedFile {
            filename: Some("clip.wav".into()),
            content_type: Some("audio/wav".into()),
            data: Bytes::from_static(b"RIFF0000WAVE"),
        };
        let path = save_upload(&dir.path().join("nested"), &file).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"RIFF0000WAVE");
    }
}
