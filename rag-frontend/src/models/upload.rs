use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UploadId(Uuid);

impl UploadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            UploadStatus::Uploading => "Uploading...",
            UploadStatus::Success => "Success",
            UploadStatus::Error => "Failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, UploadStatus::Uploading)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadTask {
    pub id: UploadId,
    pub file_name: String,
    /// 0..=100
    pub progress_percent: u8,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub(crate) seq: u64,
}

/// A file picked by the user, fully read into memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/pdf".to_string(),
            data: data.into(),
        }
    }
}

/// Query parameters of `POST /indexing/upload`, checked before sending.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct UploadParams {
    #[validate(range(min = 100, max = 2000))]
    pub chunk_size: u32,
    #[validate(range(max = 500))]
    pub chunk_overlap: u32,
    #[validate(length(min = 1, message = "Collection name cannot be empty"))]
    pub collection_name: String,
}

/// The file part of an upload, checked before sending.
#[derive(Debug)]
pub struct UploadCandidate<'a> {
    pub file_name: &'a str,
    pub size_bytes: u64,
    pub max_bytes: u64,
}

impl Validate for UploadCandidate<'_> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.file_name.to_ascii_lowercase().ends_with(".pdf") {
            let mut err = ValidationError::new("pdf_only");
            err.message = Some("Only PDF files are allowed.".into());
            errors.add("file_name", err);
        }

        if self.size_bytes == 0 {
            let mut err = ValidationError::new("empty");
            err.message = Some("File is empty.".into());
            errors.add("size_bytes", err);
        } else if self.size_bytes > self.max_bytes {
            let mut err = ValidationError::new("too_large");
            err.message = Some(
                format!(
                    "File size exceeds {:.1} MB limit.",
                    self.max_bytes as f64 / (1024.0 * 1024.0)
                )
                .into(),
            );
            errors.add("size_bytes", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// First human-readable message out of a set of validation errors.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}
