//! Document preview: metadata fetch, blob fetch and handle creation under a watchdog.
//!
//! Every `load` bumps a generation counter. Work spawned for a load carries the
//! generation it was started with, and its outcome is applied only while that
//! generation is still current and the state is still `Loading`. This is what
//! makes a newer selection, a fired watchdog or a teardown win over late results.

use crate::config::PreviewSettings;
use crate::controllers::resource_registry::{ObjectUrlStore, ResourceHandleRegistry};
use crate::models::document::{DocumentRef, FileName};
use crate::models::preview::{ObjectUrl, PreviewErrorReason, PreviewReady, PreviewState};
use crate::services::backend::DocumentBackend;
use crate::services::metrics;
use bytes::Bytes;
use chrono::Utc;
use client_core::ApiError;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Drives the preview of one document at a time.
pub struct DocumentPreviewController {
    shared: Arc<Shared>,
}

struct Shared {
    backend: Arc<dyn DocumentBackend>,
    watchdog_after: Duration,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<PreviewState>,
    document_tx: watch::Sender<Option<DocumentRef>>,
    /// Cancelled on teardown; pending pipelines stop at their next suspension point.
    shutdown: CancellationToken,
}

struct Inner {
    generation: u64,
    registry: ResourceHandleRegistry,
    watchdog: Option<Watchdog>,
}

/// Successful result of the fetch pipeline.
struct Fetched {
    document: DocumentRef,
    file_name: FileName,
    data: Bytes,
}

type FetchError = (PreviewErrorReason, ApiError);

/// Armed timer for one load. Disarmed when dropped.
struct Watchdog {
    cancel: CancellationToken,
}

impl Watchdog {
    fn arm(shared: Weak<Shared>, generation: u64, after: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(after) => {
                    if let Some(shared) = shared.upgrade() {
                        shared.expire(generation);
                    }
                }
            }
        });

        Self { cancel }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl DocumentPreviewController {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        store: ObjectUrlStore,
        settings: &PreviewSettings,
    ) -> Self {
        let (state_tx, _) = watch::channel(PreviewState::Idle);
        let (document_tx, _) = watch::channel(None);

        Self {
            shared: Arc::new(Shared {
                backend,
                watchdog_after: settings.watchdog(),
                inner: Mutex::new(Inner {
                    generation: 0,
                    registry: ResourceHandleRegistry::new(store),
                    watchdog: None,
                }),
                state_tx,
                document_tx,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Start previewing `document_id`, superseding whatever was loading or shown.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn load(&self, document_id: impl Into<String>) {
        let document_id = document_id.into();

        let generation = {
            let mut inner = self.shared.lock();
            inner.generation += 1;
            let generation = inner.generation;

            inner.registry.release();
            inner.watchdog = Some(Watchdog::arm(
                Arc::downgrade(&self.shared),
                generation,
                self.shared.watchdog_after,
            ));
            self.shared.document_tx.send_replace(None);
            self.shared.state_tx.send_replace(PreviewState::Loading {
                document_id: document_id.clone(),
                started_at: Utc::now(),
            });
            generation
        };

        tracing::info!(document_id = %document_id, generation, "Loading document preview");

        let shared = Arc::downgrade(&self.shared);
        let backend = self.shared.backend.clone();
        let shutdown = self.shared.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = run_pipeline(shared, backend, generation, document_id) => {}
            }
        });
    }

    /// Restart the current document from scratch. Only valid from the error state.
    pub fn retry(&self) -> bool {
        let document_id = match &*self.shared.state_tx.borrow() {
            PreviewState::Error { document_id, .. } => document_id.clone(),
            _ => return false,
        };

        tracing::info!(document_id = %document_id, "Retrying document preview");
        self.load(document_id);
        true
    }

    /// Release the handle, disarm the watchdog and return to `Idle`.
    pub fn dispose(&self) {
        self.shared.teardown();
    }

    pub fn state(&self) -> PreviewState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.shared.state_tx.subscribe()
    }

    /// Metadata of the document being previewed, published once its metadata resolves.
    pub fn document(&self) -> Option<DocumentRef> {
        self.shared.document_tx.borrow().clone()
    }

    pub fn subscribe_document(&self) -> watch::Receiver<Option<DocumentRef>> {
        self.shared.document_tx.subscribe()
    }

    /// Wait until the current load has finished one way or the other.
    pub async fn settled(&self) -> PreviewState {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// URL of the live handle, if any.
    pub fn live_handle(&self) -> Option<ObjectUrl> {
        let inner = self.shared.lock();
        inner.registry.current().map(|handle| handle.url().clone())
    }

    /// Bytes and file name behind a ready preview, for saving to disk.
    pub fn download(&self) -> Option<(FileName, Bytes)> {
        let ready = self.state().ready().cloned()?;
        let inner = self.shared.lock();
        let data = inner.registry.store().resolve(&ready.resource.handle)?;
        Some((ready.file_name, data))
    }
}

impl Drop for DocumentPreviewController {
    fn drop(&mut self) {
        self.shared.teardown();
        self.shared.shutdown.cancel();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether results for `generation` may still be applied.
    fn is_current(&self, inner: &Inner, generation: u64) -> bool {
        inner.generation == generation && self.state_tx.borrow().is_loading()
    }

    fn publish_document(&self, generation: u64, document: &DocumentRef) {
        let inner = self.lock();
        if self.is_current(&inner, generation) {
            self.document_tx.send_replace(Some(document.clone()));
        }
    }

    fn apply(&self, generation: u64, document_id: String, outcome: Result<Fetched, FetchError>) {
        let mut inner = self.lock();
        if !self.is_current(&inner, generation) {
            tracing::debug!(
                document_id = %document_id,
                generation,
                current = inner.generation,
                "Discarding stale preview result"
            );
            return;
        }

        inner.watchdog = None;

        match outcome {
            Ok(fetched) => {
                let resource = inner
                    .registry
                    .acquire(fetched.data, fetched.file_name.mime_hint())
                    .describe();

                tracing::info!(
                    document_id = %document_id,
                    file_name = %fetched.file_name,
                    size_bytes = resource.size_bytes,
                    "Document preview ready"
                );
                metrics::record_preview_load("ready");

                self.state_tx.send_replace(PreviewState::Ready(PreviewReady {
                    document: fetched.document,
                    file_name: fetched.file_name,
                    resource,
                }));
            }
            Err((reason, error)) => {
                inner.registry.release();

                tracing::warn!(
                    document_id = %document_id,
                    reason = %reason,
                    error = %error,
                    "Document preview failed"
                );
                metrics::record_preview_load(error.kind());

                self.state_tx.send_replace(PreviewState::Error {
                    document_id,
                    reason,
                    error,
                    retryable: true,
                });
            }
        }
    }

    fn expire(&self, generation: u64) {
        let mut inner = self.lock();
        if !self.is_current(&inner, generation) {
            return;
        }

        let document_id = match &*self.state_tx.borrow() {
            PreviewState::Loading { document_id, .. } => document_id.clone(),
            _ => return,
        };

        inner.watchdog = None;
        inner.registry.release();

        tracing::warn!(
            document_id = %document_id,
            timeout_secs = self.watchdog_after.as_secs(),
            "Document preview timed out"
        );
        metrics::record_preview_load("timeout");

        self.state_tx.send_replace(PreviewState::Error {
            document_id,
            reason: PreviewErrorReason::Timeout,
            error: ApiError::Timeout(format!(
                "Preview did not finish within {}s",
                self.watchdog_after.as_secs()
            )),
            retryable: true,
        });
    }

    fn teardown(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.watchdog = None;
        inner.registry.release();
        self.document_tx.send_replace(None);
        self.state_tx.send_replace(PreviewState::Idle);
    }
}

async fn run_pipeline(
    shared: Weak<Shared>,
    backend: Arc<dyn DocumentBackend>,
    generation: u64,
    document_id: String,
) {
    let outcome = fetch(&shared, backend.as_ref(), generation, &document_id).await;

    if let Some(shared) = shared.upgrade() {
        shared.apply(generation, document_id, outcome);
    }
}

async fn fetch(
    shared: &Weak<Shared>,
    backend: &dyn DocumentBackend,
    generation: u64,
    document_id: &str,
) -> Result<Fetched, FetchError> {
    let info = backend
        .get_document(document_id)
        .await
        .map_err(|e| (PreviewErrorReason::MetadataFetchFailed, e))?;

    let document = info.to_ref().ok_or_else(|| {
        (
            PreviewErrorReason::MetadataFetchFailed,
            ApiError::InvalidContent(format!("Document {} has no storage path", document_id)),
        )
    })?;

    if let Some(shared) = shared.upgrade() {
        shared.publish_document(generation, &document);
    }

    let file_name = FileName::from_storage_path(&document.storage_path);
    let data = backend
        .fetch_blob(file_name.as_str())
        .await
        .map_err(|e| (PreviewErrorReason::ContentFetchFailed, e))?;

    if data.is_empty() {
        return Err((
            PreviewErrorReason::ContentFetchFailed,
            ApiError::InvalidContent(format!("{} is empty", file_name)),
        ));
    }

    Ok(Fetched {
        document,
        file_name,
        data,
    })
}
