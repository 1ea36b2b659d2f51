//! Paging over `GET /files/`.

use crate::config::LibrarySettings;
use crate::models::document::DocumentInfo;
use crate::services::backend::DocumentBackend;
use client_core::{retry_call, ApiError, RetryConfig};
use std::sync::Arc;

/// Largest page the listing endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Position in the document library. Page numbers are one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page_number: u32,
    pub page_size: u32,
    /// As reported by the last successful listing.
    pub total_records: u64,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            total_records: 0,
        }
    }

    /// Number of pages needed for `total_records`; zero for an empty library.
    pub fn total_pages(&self) -> u32 {
        pages_for(self.total_records, self.page_size)
    }

    /// Nearest page number that exists for the current total (at least 1).
    pub fn clamp_page(&self, page_number: u32) -> u32 {
        page_number.clamp(1, self.total_pages().max(1))
    }

    /// Table widgets count pages from zero; the backend counts from one.
    pub fn from_zero_based(page_index: u32) -> u32 {
        page_index.saturating_add(1)
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }
}

fn pages_for(total_records: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    u32::try_from(total_records.div_ceil(page_size)).unwrap_or(u32::MAX)
}

pub struct DocumentCollectionPager {
    backend: Arc<dyn DocumentBackend>,
    retry: RetryConfig,
    cursor: PageCursor,
    items: Vec<DocumentInfo>,
}

impl DocumentCollectionPager {
    pub fn new(backend: Arc<dyn DocumentBackend>, settings: &LibrarySettings) -> Self {
        Self {
            backend,
            retry: RetryConfig::immediate(settings.max_retries),
            cursor: PageCursor::new(settings.page_size),
            items: Vec::new(),
        }
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn items(&self) -> &[DocumentInfo] {
        &self.items
    }

    /// Fetch page `page_number` (one-based) of `page_size` rows.
    ///
    /// Transient failures are retried back to back; if they persist the error is
    /// returned and the cursor and items keep their last successful values.
    pub async fn set_page(
        &mut self,
        page_number: u32,
        page_size: u32,
    ) -> Result<&[DocumentInfo], ApiError> {
        let page_number = page_number.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let backend = &self.backend;

        let response = retry_call(&self.retry, "list_documents", move || {
            backend.list_documents(page_number, page_size)
        })
        .await?;

        tracing::debug!(
            page_number,
            page_size,
            total_records = response.total_records,
            rows = response.doc_details.len(),
            "Document page loaded"
        );

        self.cursor = PageCursor {
            page_number,
            page_size,
            total_records: response.total_records,
        };
        self.items = response.doc_details;
        Ok(&self.items)
    }

    /// Re-issue the current page.
    pub async fn refresh(&mut self) -> Result<&[DocumentInfo], ApiError> {
        let PageCursor {
            page_number,
            page_size,
            ..
        } = self.cursor;
        self.set_page(page_number, page_size).await
    }

    /// Delete a document, then reload the page, stepping back if it emptied.
    pub async fn delete(&mut self, document_id: &str) -> Result<(), ApiError> {
        self.backend.delete_document(document_id).await?;
        tracing::info!(document_id = %document_id, "Document deleted");

        let remaining = self.cursor.total_records.saturating_sub(1);
        let last_page = pages_for(remaining, self.cursor.page_size).max(1);
        let page_number = self.cursor.page_number.min(last_page);
        let page_size = self.cursor.page_size;

        self.set_page(page_number, page_size).await?;
        Ok(())
    }
}
