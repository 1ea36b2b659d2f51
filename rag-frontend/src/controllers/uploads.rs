//! Concurrent document uploads, tracked per file.

use crate::config::UploadSettings;
use crate::models::upload::{
    first_validation_message, UploadCandidate, UploadFile, UploadId, UploadParams, UploadStatus,
    UploadTask,
};
use crate::services::backend::{DocumentBackend, ProgressFn};
use crate::services::metrics;
use crate::services::notifications::Notifier;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use validator::Validate;

/// Handle to one submitted file.
pub struct SubmittedUpload {
    pub id: UploadId,
    /// Resolves to the final status once the upload settles.
    pub completion: JoinHandle<UploadStatus>,
}

#[derive(Clone)]
pub struct UploadTaskTracker {
    shared: Arc<Shared>,
}

struct Shared {
    backend: Arc<dyn DocumentBackend>,
    settings: UploadSettings,
    notifier: Notifier,
    tasks: DashMap<UploadId, UploadTask>,
    next_seq: AtomicU64,
}

impl UploadTaskTracker {
    pub fn new(backend: Arc<dyn DocumentBackend>, settings: UploadSettings, notifier: Notifier) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                settings,
                notifier,
                tasks: DashMap::new(),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Upload into the configured default collection.
    pub fn submit(&self, file: UploadFile) -> SubmittedUpload {
        let collection_name = self.shared.settings.collection_name.clone();
        self.submit_to(file, &collection_name)
    }

    /// Start uploading `file` into `collection_name` and track it.
    ///
    /// A file that fails validation is recorded straight away as failed.
    /// Must be called from within a Tokio runtime.
    pub fn submit_to(&self, file: UploadFile, collection_name: &str) -> SubmittedUpload {
        let id = UploadId::new();
        let seq = self.shared.next_seq.fetch_add(1, Ordering::Relaxed);
        self.shared.tasks.insert(
            id,
            UploadTask {
                id,
                file_name: file.file_name.clone(),
                progress_percent: 0,
                status: UploadStatus::Uploading,
                error: None,
                seq,
            },
        );

        let params = UploadParams {
            chunk_size: self.shared.settings.chunk_size,
            chunk_overlap: self.shared.settings.chunk_overlap,
            collection_name: collection_name.to_string(),
        };

        let candidate = UploadCandidate {
            file_name: &file.file_name,
            size_bytes: file.data.len() as u64,
            max_bytes: self.shared.settings.max_file_bytes,
        };

        if let Err(errors) = candidate.validate().and_then(|_| params.validate()) {
            let message = first_validation_message(&errors);
            tracing::warn!(upload_id = %id, file_name = %file.file_name, %message, "Upload rejected");
            metrics::record_upload("rejected");
            self.shared.fail(id, &file.file_name, message);
            return SubmittedUpload {
                id,
                completion: tokio::spawn(async { UploadStatus::Error }),
            };
        }

        tracing::info!(
            upload_id = %id,
            file_name = %file.file_name,
            size_bytes = file.data.len(),
            collection_name = %collection_name,
            "Upload started"
        );

        let progress = progress_reporter(Arc::downgrade(&self.shared), id);
        let shared = self.shared.clone();
        let completion = tokio::spawn(async move {
            let file_name = file.file_name.clone();
            match shared.backend.upload(file, &params, progress).await {
                Ok(response) => {
                    tracing::info!(
                        upload_id = %id,
                        file_name = %file_name,
                        chunk_count = response.chunk_count,
                        "Upload finished"
                    );
                    metrics::record_upload("success");
                    shared.succeed(id, &file_name);
                    UploadStatus::Success
                }
                Err(e) => {
                    tracing::warn!(upload_id = %id, file_name = %file_name, error = %e, "Upload failed");
                    metrics::record_upload(e.kind());
                    shared.fail(id, &file_name, e.user_message().to_string());
                    UploadStatus::Error
                }
            }
        });

        SubmittedUpload { id, completion }
    }

    /// Snapshot of all tracked uploads in submission order.
    pub fn tasks(&self) -> Vec<UploadTask> {
        let mut tasks: Vec<UploadTask> = self
            .shared
            .tasks
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        tasks.sort_by_key(|task| task.seq);
        tasks
    }

    pub fn task(&self, id: UploadId) -> Option<UploadTask> {
        self.shared.tasks.get(&id).map(|entry| entry.value().clone())
    }

    /// Forget every upload that is no longer running. Returns how many were removed.
    pub fn clear_completed(&self) -> usize {
        let before = self.shared.tasks.len();
        self.shared
            .tasks
            .retain(|_, task| task.status == UploadStatus::Uploading);
        before - self.shared.tasks.len()
    }
}

impl Shared {
    fn succeed(&self, id: UploadId, file_name: &str) {
        if let Some(mut task) = self.tasks.get_mut(&id) {
            task.status = UploadStatus::Success;
            task.progress_percent = 100;
        }
        self.notifier
            .info(format!("{} uploaded successfully!", file_name));
    }

    fn fail(&self, id: UploadId, file_name: &str, message: String) {
        if let Some(mut task) = self.tasks.get_mut(&id) {
            task.status = UploadStatus::Error;
            task.error = Some(message.clone());
        }
        self.notifier
            .error(format!("Failed to upload {}: {}", file_name, message));
    }
}

fn progress_reporter(shared: Weak<Shared>, id: UploadId) -> ProgressFn {
    Arc::new(move |sent, total| {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let percent = if total == 0 {
            100
        } else {
            (sent.saturating_mul(100) / total).min(100) as u8
        };

        if let Some(mut task) = shared.tasks.get_mut(&id) {
            if task.status == UploadStatus::Uploading && percent > task.progress_percent {
                task.progress_percent = percent;
            }
        };
    })
}
