#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use client_core::ApiError;
use rag_frontend::config::Settings;
use rag_frontend::models::chat::{ChatRequest, ChatResponse, SearchResult};
use rag_frontend::models::document::{
    CollectionInfo, DocumentInfo, DocumentListResponse, UploadResponse,
};
use rag_frontend::models::upload::{UploadFile, UploadParams};
use rag_frontend::services::{ChatBackend, DocumentBackend, ProgressFn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const TEST_COLLECTION: &str = "report_pdf";

pub fn test_settings() -> Settings {
    Settings::default()
}

pub fn server_error() -> ApiError {
    ApiError::ServerError {
        status: 503,
        message: "backend unavailable".to_string(),
    }
}

pub fn pdf_bytes(len: usize) -> Bytes {
    let mut data = b"%PDF-1.7\n".to_vec();
    data.resize(len, b'x');
    Bytes::from(data)
}

/// Failure injected for the next `remaining` calls.
struct Failure {
    error: ApiError,
    remaining: u32,
}

fn take_failure(failures: &Mutex<HashMap<String, Failure>>, key: &str) -> Option<ApiError> {
    let mut failures = failures.lock().unwrap();
    let failure = failures.get_mut(key)?;
    if failure.remaining == 0 {
        return None;
    }
    failure.remaining -= 1;
    Some(failure.error.clone())
}

/// In-memory stand-in for the `/files` and `/indexing` endpoints.
#[derive(Default)]
pub struct FakeDocumentBackend {
    documents: Mutex<Vec<DocumentInfo>>,
    blobs: Mutex<HashMap<String, Bytes>>,
    metadata_delays: Mutex<HashMap<String, Duration>>,
    blob_delays: Mutex<HashMap<String, Duration>>,
    upload_delays: Mutex<HashMap<String, Duration>>,
    metadata_failures: Mutex<HashMap<String, Failure>>,
    blob_failures: Mutex<HashMap<String, Failure>>,
    upload_failures: Mutex<HashMap<String, Failure>>,
    listing_failure: Mutex<Option<Failure>>,
    pub metadata_calls: AtomicU32,
    pub blob_calls: AtomicU32,
    pub list_calls: AtomicU32,
    pub upload_calls: AtomicU32,
}

impl FakeDocumentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document whose file lives at `storage_path` with `data` as content.
    pub fn with_document(self, id: &str, storage_path: &str, data: Bytes) -> Self {
        let file_name = storage_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string();

        self.documents.lock().unwrap().push(DocumentInfo {
            id: id.to_string(),
            collection_name: TEST_COLLECTION.to_string(),
            filename: file_name.clone(),
            document_count: 1,
            chunk_count: 4,
            file_size: Some(data.len() as i64),
            upload_date: Some("2024-01-15T10:00:00".to_string()),
            storage_path: Some(storage_path.to_string()),
        });
        self.blobs.lock().unwrap().insert(file_name, data);
        self
    }

    /// Register `count` listing rows named `doc-<n>.pdf`.
    pub fn with_listing(self, count: usize) -> Self {
        let mut this = self;
        for n in 1..=count {
            this = this.with_document(
                &n.to_string(),
                &format!("/filestorage/doc-{}.pdf", n),
                pdf_bytes(1024),
            );
        }
        this
    }

    pub fn delay_metadata(self, id: &str, delay: Duration) -> Self {
        self.metadata_delays
            .lock()
            .unwrap()
            .insert(id.to_string(), delay);
        self
    }

    pub fn delay_blob(self, file_name: &str, delay: Duration) -> Self {
        self.blob_delays
            .lock()
            .unwrap()
            .insert(file_name.to_string(), delay);
        self
    }

    pub fn delay_upload(self, file_name: &str, delay: Duration) -> Self {
        self.upload_delays
            .lock()
            .unwrap()
            .insert(file_name.to_string(), delay);
        self
    }

    pub fn fail_metadata(self, id: &str, error: ApiError, times: u32) -> Self {
        self.metadata_failures.lock().unwrap().insert(
            id.to_string(),
            Failure {
                error,
                remaining: times,
            },
        );
        self
    }

    pub fn fail_blob(self, file_name: &str, error: ApiError, times: u32) -> Self {
        self.blob_failures.lock().unwrap().insert(
            file_name.to_string(),
            Failure {
                error,
                remaining: times,
            },
        );
        self
    }

    pub fn fail_upload(self, file_name: &str, error: ApiError) -> Self {
        self.upload_failures.lock().unwrap().insert(
            file_name.to_string(),
            Failure {
                error,
                remaining: u32::MAX,
            },
        );
        self
    }

    /// Fail the next `times` listing requests.
    pub fn fail_listing(&self, error: ApiError, times: u32) {
        *self.listing_failure.lock().unwrap() = Some(Failure {
            error,
            remaining: times,
        });
    }

    pub fn calls(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    fn delay_for(delays: &Mutex<HashMap<String, Duration>>, key: &str) -> Option<Duration> {
        delays.lock().unwrap().get(key).copied()
    }
}

#[async_trait]
impl DocumentBackend for FakeDocumentBackend {
    async fn get_document(&self, document_id: &str) -> Result<DocumentInfo, ApiError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = Self::delay_for(&self.metadata_delays, document_id) {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = take_failure(&self.metadata_failures, document_id) {
            return Err(error);
        }

        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|doc| doc.id == document_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Document {} not found", document_id)))
    }

    async fn fetch_blob(&self, path: &str) -> Result<Bytes, ApiError> {
        self.blob_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = Self::delay_for(&self.blob_delays, path) {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = take_failure(&self.blob_failures, path) {
            return Err(error);
        }

        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("File {} not found", path)))
    }

    async fn list_documents(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<DocumentListResponse, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut failure = self.listing_failure.lock().unwrap();
            if let Some(f) = failure.as_mut() {
                if f.remaining > 0 {
                    f.remaining -= 1;
                    return Err(f.error.clone());
                }
            }
        }

        let documents = self.documents.lock().unwrap();
        let start = ((page_number - 1) * page_size) as usize;
        let doc_details = documents
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        Ok(DocumentListResponse {
            doc_details,
            total_records: documents.len() as u64,
        })
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), ApiError> {
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|doc| doc.id != document_id);
        if documents.len() == before {
            return Err(ApiError::NotFound(format!(
                "Document {} not found",
                document_id
            )));
        }
        Ok(())
    }

    async fn upload(
        &self,
        file: UploadFile,
        params: &UploadParams,
        progress: ProgressFn,
    ) -> Result<UploadResponse, ApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let total = file.data.len() as u64;

        progress(total / 2, total);
        if let Some(delay) = Self::delay_for(&self.upload_delays, &file.file_name) {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = take_failure(&self.upload_failures, &file.file_name) {
            return Err(error);
        }
        progress(total, total);

        Ok(UploadResponse {
            message: "Document indexed".to_string(),
            collection_name: params.collection_name.clone(),
            document_count: 1,
            chunk_count: 3,
            file_path: Some(format!("/filestorage/{}", file.file_name)),
        })
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, ApiError> {
        Ok(vec![CollectionInfo {
            name: TEST_COLLECTION.to_string(),
            vectors_count: 42,
        }])
    }
}

/// Chat backend that answers `Answer to: <query>` after a configurable delay.
#[derive(Default)]
pub struct FakeChatBackend {
    delay: Mutex<Duration>,
    next_error: Mutex<Option<ApiError>>,
    pub requests: Mutex<Vec<ChatRequest>>,
    pub sample_questions: Mutex<Option<Vec<String>>>,
}

impl FakeChatBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn fail_next(&self, error: ApiError) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatBackend for FakeChatBackend {
    async fn query(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Err(error);
        }

        Ok(ChatResponse {
            answer: format!("Answer to: {}", request.query),
            search_results: vec![SearchResult {
                page_content: "relevant passage".to_string(),
                page_number: Some(serde_json::json!(2)),
                source: Some("report.pdf".to_string()),
                score: Some(0.87),
            }],
            query: Some(request.query),
            collection_name: Some(request.collection_name),
            model_used: Some(request.model),
        })
    }

    async fn sample_questions(
        &self,
        _collection_name: &str,
        limit: u32,
    ) -> Result<Vec<String>, ApiError> {
        match self.sample_questions.lock().unwrap().clone() {
            Some(questions) => Ok(questions.into_iter().take(limit as usize).collect()),
            None => Err(server_error()),
        }
    }
}
