mod common;

use bytes::Bytes;
use common::{pdf_bytes, server_error, test_settings, FakeDocumentBackend};
use rag_frontend::controllers::UploadTaskTracker;
use rag_frontend::models::{UploadFile, UploadStatus};
use rag_frontend::services::{NotificationLevel, Notifier};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn tracker(backend: &Arc<FakeDocumentBackend>) -> (UploadTaskTracker, Notifier) {
    let notifier = Notifier::new();
    let tracker = UploadTaskTracker::new(backend.clone(), test_settings().upload, notifier.clone());
    (tracker, notifier)
}

#[tokio::test(start_paused = true)]
async fn test_successful_upload_reaches_full_progress() {
    let backend = Arc::new(FakeDocumentBackend::new());
    let (tracker, notifier) = tracker(&backend);
    let mut notifications = notifier.subscribe();

    let upload = tracker.submit(UploadFile::new("report.pdf", pdf_bytes(4096)));
    assert_eq!(tracker.task(upload.id).unwrap().status, UploadStatus::Uploading);

    assert_eq!(upload.completion.await.unwrap(), UploadStatus::Success);

    let task = tracker.task(upload.id).unwrap();
    assert_eq!(task.status, UploadStatus::Success);
    assert_eq!(task.progress_percent, 100);
    assert!(task.error.is_none());

    let notification = notifications.recv().await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Info);
    assert_eq!(notification.message, "report.pdf uploaded successfully!");
    assert_eq!(notification.duration, Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_reported_while_uploading() {
    let backend = Arc::new(
        FakeDocumentBackend::new().delay_upload("slow.pdf", Duration::from_secs(5)),
    );
    let (tracker, _) = tracker(&backend);

    let upload = tracker.submit(UploadFile::new("slow.pdf", pdf_bytes(1000)));
    tokio::time::sleep(Duration::from_secs(1)).await;

    let task = tracker.task(upload.id).unwrap();
    assert_eq!(task.status, UploadStatus::Uploading);
    assert_eq!(task.progress_percent, 50);

    upload.completion.await.unwrap();
    assert_eq!(tracker.task(upload.id).unwrap().progress_percent, 100);
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_does_not_affect_siblings() {
    let backend = Arc::new(
        FakeDocumentBackend::new()
            .fail_upload("broken.pdf", server_error())
            .delay_upload("good.pdf", Duration::from_secs(2)),
    );
    let (tracker, notifier) = tracker(&backend);
    let mut notifications = notifier.subscribe();

    let broken = tracker.submit(UploadFile::new("broken.pdf", pdf_bytes(2048)));
    let good = tracker.submit(UploadFile::new("good.pdf", pdf_bytes(2048)));

    assert_eq!(broken.completion.await.unwrap(), UploadStatus::Error);
    assert_eq!(
        tracker.task(good.id).unwrap().status,
        UploadStatus::Uploading
    );
    assert_eq!(good.completion.await.unwrap(), UploadStatus::Success);

    let failed = tracker.task(broken.id).unwrap();
    assert_eq!(failed.status, UploadStatus::Error);
    assert_eq!(
        failed.error.as_deref(),
        Some("The server encountered an error. Please try again.")
    );
    assert!(failed.progress_percent < 100);

    let first = notifications.recv().await.unwrap();
    assert_eq!(first.level, NotificationLevel::Error);
    assert!(first.message.starts_with("Failed to upload broken.pdf:"));
    assert_eq!(first.duration, Duration::from_secs(5));

    let second = notifications.recv().await.unwrap();
    assert_eq!(second.message, "good.pdf uploaded successfully!");
}

#[tokio::test(start_paused = true)]
async fn test_invalid_file_is_rejected_without_request() {
    let backend = Arc::new(FakeDocumentBackend::new());
    let (tracker, notifier) = tracker(&backend);
    let mut notifications = notifier.subscribe();

    let upload = tracker.submit(UploadFile::new("notes.txt", Bytes::from_static(b"hello")));

    let task = tracker.task(upload.id).unwrap();
    assert_eq!(task.status, UploadStatus::Error);
    assert_eq!(task.error.as_deref(), Some("Only PDF files are allowed."));
    assert_eq!(upload.completion.await.unwrap(), UploadStatus::Error);
    assert_eq!(backend.upload_calls.load(Ordering::SeqCst), 0);

    let notification = notifications.recv().await.unwrap();
    assert_eq!(
        notification.message,
        "Failed to upload notes.txt: Only PDF files are allowed."
    );
}

#[tokio::test(start_paused = true)]
async fn test_oversized_and_empty_files_are_rejected() {
    let backend = Arc::new(FakeDocumentBackend::new());
    let (tracker, _) = tracker(&backend);
    let limit = test_settings().upload.max_file_bytes as usize;

    let big = tracker.submit(UploadFile::new("big.pdf", pdf_bytes(limit + 1)));
    let empty = tracker.submit(UploadFile::new("empty.pdf", Bytes::new()));

    assert_eq!(big.completion.await.unwrap(), UploadStatus::Error);
    assert_eq!(empty.completion.await.unwrap(), UploadStatus::Error);
    assert_eq!(
        tracker.task(big.id).unwrap().error.as_deref(),
        Some("File size exceeds 5.0 MB limit.")
    );
    assert_eq!(
        tracker.task(empty.id).unwrap().error.as_deref(),
        Some("File is empty.")
    );
    assert_eq!(backend.upload_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_collection_name_is_rejected() {
    let backend = Arc::new(FakeDocumentBackend::new());
    let (tracker, _) = tracker(&backend);

    let upload = tracker.submit_to(UploadFile::new("report.pdf", pdf_bytes(64)), "");

    assert_eq!(upload.completion.await.unwrap(), UploadStatus::Error);
    assert_eq!(
        tracker.task(upload.id).unwrap().error.as_deref(),
        Some("Collection name cannot be empty")
    );
    assert_eq!(backend.upload_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_clear_completed_keeps_running_uploads() {
    let backend = Arc::new(
        FakeDocumentBackend::new()
            .delay_upload("slow.pdf", Duration::from_secs(30))
            .fail_upload("broken.pdf", server_error()),
    );
    let (tracker, _) = tracker(&backend);

    let done = tracker.submit(UploadFile::new("done.pdf", pdf_bytes(64)));
    let slow = tracker.submit(UploadFile::new("slow.pdf", pdf_bytes(64)));
    let broken = tracker.submit(UploadFile::new("broken.pdf", pdf_bytes(64)));
    done.completion.await.unwrap();
    broken.completion.await.unwrap();

    assert_eq!(tracker.tasks().len(), 3);
    assert_eq!(tracker.clear_completed(), 2);

    let remaining = tracker.tasks();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, slow.id);
    assert_eq!(remaining[0].status, UploadStatus::Uploading);

    slow.completion.await.unwrap();
    assert_eq!(tracker.clear_completed(), 1);
    assert!(tracker.tasks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tasks_are_listed_in_submission_order() {
    let backend = Arc::new(FakeDocumentBackend::new());
    let (tracker, _) = tracker(&backend);

    let names = ["c.pdf", "a.pdf", "b.pdf", "d.pdf"];
    let mut completions = Vec::new();
    for name in names {
        completions.push(tracker.submit(UploadFile::new(name, pdf_bytes(64))).completion);
    }
    for completion in completions {
        completion.await.unwrap();
    }

    let listed: Vec<String> = tracker.tasks().into_iter().map(|t| t.file_name).collect();
    assert_eq!(listed, names);
}
