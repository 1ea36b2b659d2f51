//! HTTP client for the backend's file and indexing endpoints.

use crate::config::BackendSettings;
use crate::models::document::{
    CollectionInfo, CollectionsResponse, DocumentInfo, DocumentListResponse, UploadResponse,
};
use crate::models::upload::{UploadFile, UploadParams};
use crate::services::backend::{DocumentBackend, ProgressFn};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use client_core::observability::TracedClientExt;
use client_core::ApiError;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Url};

/// Upload bodies are streamed in chunks of this size; progress is reported per chunk.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Build the shared reqwest client from backend settings.
pub fn build_http_client(settings: &BackendSettings) -> Result<Client> {
    let client = Client::builder()
        .timeout(settings.request_timeout())
        .connect_timeout(settings.connect_timeout())
        .build()
        .map_err(|e| {
            tracing::error!("Failed to build HTTP client: {}", e);
            anyhow::anyhow!("HTTP client construction failed: {}", e)
        })?;

    Ok(client)
}

/// Join `segments` onto `base`, percent-encoding each one as a single path segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<String, ApiError> {
    let mut url = Url::parse(base)
        .map_err(|e| ApiError::Unknown(format!("Invalid backend URL {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Unknown(format!("Backend URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url.into())
}

/// Document client for the `/files` and `/indexing` endpoints.
#[derive(Clone)]
pub struct DocumentClient {
    client: Client,
    pub settings: BackendSettings,
}

impl DocumentClient {
    pub fn new(settings: BackendSettings) -> Result<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: BackendSettings) -> Self {
        Self { client, settings }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url.trim_end_matches('/'), path)
    }

    fn document_url(&self, document_id: &str) -> Result<String, ApiError> {
        endpoint(&self.settings.url, &["files", document_id])
    }
}

#[async_trait]
impl DocumentBackend for DocumentClient {
    async fn get_document(&self, document_id: &str) -> Result<DocumentInfo, ApiError> {
        let url = self.document_url(document_id)?;

        let response = self.client.traced_get(&url).send().await.map_err(|e| {
            tracing::error!(document_id = %document_id, error = %e, "Get document failed");
            ApiError::from(e)
        })?;
        let response = ApiError::check_response(response).await?;

        Ok(response.json::<DocumentInfo>().await?)
    }

    async fn fetch_blob(&self, path: &str) -> Result<Bytes, ApiError> {
        let url = self.url("/files/blob");

        let response = self
            .client
            .traced_get(&url)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Blob download failed");
                ApiError::from(e)
            })?;
        let response = ApiError::check_response(response).await?;

        let data = response.bytes().await?;
        tracing::debug!(path = %path, size = data.len(), "Blob downloaded");
        Ok(data)
    }

    async fn list_documents(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<DocumentListResponse, ApiError> {
        let url = self.url("/files/");

        let response = self
            .client
            .traced_get(&url)
            .query(&[("page_number", page_number), ("page_size", page_size)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(page_number, page_size, error = %e, "List documents failed");
                ApiError::from(e)
            })?;
        let response = ApiError::check_response(response).await?;

        Ok(response.json::<DocumentListResponse>().await?)
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), ApiError> {
        let url = self.document_url(document_id)?;

        let response = self.client.traced_delete(&url).send().await.map_err(|e| {
            tracing::error!(document_id = %document_id, error = %e, "Delete failed");
            ApiError::from(e)
        })?;
        ApiError::check_response(response).await?;

        Ok(())
    }

    async fn upload(
        &self,
        file: UploadFile,
        params: &UploadParams,
        progress: ProgressFn,
    ) -> Result<UploadResponse, ApiError> {
        let url = self.url("/indexing/upload");
        let total = file.data.len() as u64;

        let chunks: Vec<Bytes> = (0..file.data.len())
            .step_by(UPLOAD_CHUNK_BYTES)
            .map(|start| {
                let end = (start + UPLOAD_CHUNK_BYTES).min(file.data.len());
                file.data.slice(start..end)
            })
            .collect();

        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            progress(sent, total);
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| ApiError::InvalidContent(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .traced_post(&url)
            .query(params)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(file_name = %file.file_name, error = %e, "Upload failed");
                ApiError::from(e)
            })?;
        let response = ApiError::check_response(response).await?;

        Ok(response.json::<UploadResponse>().await?)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, ApiError> {
        let url = self.url("/indexing/collections");

        let response = self.client.traced_get(&url).send().await?;
        let response = ApiError::check_response(response).await?;

        Ok(response.json::<CollectionsResponse>().await?.collections)
    }
}
