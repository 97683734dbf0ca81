//! Multipart upload helpers shared by the CSV routes

use std::io::Write;
use std::path::Path;

use axum::extract::Multipart;
use tempfile::NamedTempFile;

use crate::{AppError, MAX_UPLOAD_SIZE};

/// Content types accepted when the filename does not end in `.csv`
const CSV_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "text/plain",
    "application/vnd.ms-excel",
    "application/octet-stream",
];

/// A file read from a multipart form
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Whether this looks like a CSV by name or declared type
    pub fn looks_like_csv(&self) -> bool {
        let by_name = self
            .file_name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().ends_with(".csv"));
        let by_type = self.content_type.as_deref().is_some_and(|ct| {
            let essence = ct.split(';').next().unwrap_or("").trim().to_lowercase();
            CSV_CONTENT_TYPES.contains(&essence.as_str())
        });
        by_name || by_type
    }
}

/// Read the named file field out of a multipart form
///
/// Other fields are skipped. Returns None when the field is absent.
pub async fn read_file_field(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Option<UploadedFile>, AppError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;

        // Check file size limit
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::bad_request(&format!(
                "File too large. Maximum size is {} MB",
                MAX_UPLOAD_SIZE / 1024 / 1024
            )));
        }

        file = Some(UploadedFile {
            file_name,
            content_type,
            data: bytes.to_vec(),
        });
    }

    Ok(file)
}

/// Write an upload to a temporary file in `dir`
///
/// The file is deleted when the returned handle drops.
pub fn spool_to_disk(dir: &Path, data: &[u8]) -> std::io::Result<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".csv")
        .tempfile_in(dir)?;
    file.write_all(data)?;
    file.flush()?;
    Ok(file)
}
