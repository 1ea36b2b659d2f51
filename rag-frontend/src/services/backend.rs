//! Backend abstractions consumed by the controllers.
//!
//! The HTTP clients in this module tree implement them against the RAG
//! backend; tests substitute in-memory fakes.

use crate::models::chat::{ChatRequest, ChatResponse};
use crate::models::document::{CollectionInfo, DocumentInfo, DocumentListResponse, UploadResponse};
use crate::models::upload::{UploadFile, UploadParams};
use async_trait::async_trait;
use bytes::Bytes;
use client_core::ApiError;
use std::sync::Arc;

/// Upload progress callback: `(bytes_sent, bytes_total)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// `GET /files/{id}`
    async fn get_document(&self, document_id: &str) -> Result<DocumentInfo, ApiError>;

    /// `GET /files/blob?path=...`
    async fn fetch_blob(&self, path: &str) -> Result<Bytes, ApiError>;

    /// `GET /files/` with a one-based page number.
    async fn list_documents(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<DocumentListResponse, ApiError>;

    /// `DELETE /files/{id}`
    async fn delete_document(&self, document_id: &str) -> Result<(), ApiError>;

    /// `POST /indexing/upload`
    async fn upload(
        &self,
        file: UploadFile,
        params: &UploadParams,
        progress: ProgressFn,
    ) -> Result<UploadResponse, ApiError>;

    /// `GET /indexing/collections`
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, ApiError>;
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /chat`
    async fn query(&self, request: ChatRequest) -> Result<ChatResponse, ApiError>;

    /// `GET /chat/{collection_name}/sample?limit=...`
    async fn sample_questions(
        &self,
        collection_name: &str,
        limit: u32,
    ) -> Result<Vec<String>, ApiError>;
}
