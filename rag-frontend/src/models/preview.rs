use crate::models::document::{DocumentRef, FileName};
use chrono::{DateTime, Utc};
use client_core::ApiError;
use std::fmt;

/// Opaque, revocable reference to an in-memory byte buffer (`blob:<uuid>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub(crate) fn generate() -> Self {
        Self(format!("blob:{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// View of the live resource behind a ready preview.
///
/// The handle itself stays owned by the preview controller; this only names it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResource {
    pub handle: ObjectUrl,
    pub size_bytes: u64,
    pub mime_hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewReady {
    pub document: DocumentRef,
    pub file_name: FileName,
    pub resource: PreviewResource,
}

impl PreviewReady {
    /// Only PDFs are rendered inline; anything else gets a download affordance.
    pub fn is_previewable(&self) -> bool {
        self.file_name.is_pdf()
    }

    pub fn extension(&self) -> &str {
        self.file_name.extension()
    }

    pub fn download_name(&self) -> &str {
        self.file_name.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewErrorReason {
    MetadataFetchFailed,
    ContentFetchFailed,
    Timeout,
}

impl fmt::Display for PreviewErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PreviewErrorReason::MetadataFetchFailed => "metadata-fetch-failed",
            PreviewErrorReason::ContentFetchFailed => "content-fetch-failed",
            PreviewErrorReason::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Idle,
    Loading {
        document_id: String,
        started_at: DateTime<Utc>,
    },
    Ready(PreviewReady),
    Error {
        document_id: String,
        reason: PreviewErrorReason,
        error: ApiError,
        retryable: bool,
    },
}

impl PreviewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PreviewState::Loading { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PreviewState::Ready(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PreviewState::Error { .. })
    }

    pub fn ready(&self) -> Option<&PreviewReady> {
        match self {
            PreviewState::Ready(ready) => Some(ready),
            _ => None,
        }
    }

    pub fn error_reason(&self) -> Option<PreviewErrorReason> {
        match self {
            PreviewState::Error { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Message for the error card; `None` unless in the error state.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            PreviewState::Error {
                reason: PreviewErrorReason::Timeout,
                ..
            } => Some("Loading the document took too long."),
            PreviewState::Error { error, .. } => Some(error.user_message()),
            _ => None,
        }
    }
}
