pub mod chat;
pub mod document;
pub mod preview;
pub mod upload;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, ChatSession, RequestToken, Role};
pub use document::{DocumentInfo, DocumentListResponse, DocumentRef, FileName};
pub use preview::{ObjectUrl, PreviewErrorReason, PreviewReady, PreviewResource, PreviewState};
pub use upload::{UploadFile, UploadId, UploadParams, UploadStatus, UploadTask};
