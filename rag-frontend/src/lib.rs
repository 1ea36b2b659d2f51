pub mod config;
pub mod controllers;
pub mod models;
pub mod services;

use crate::config::Settings;
use crate::controllers::{
    ChatSessionController, DocumentCollectionPager, DocumentPreviewController, ObjectUrlStore,
    UploadTaskTracker,
};
use crate::models::document::CollectionInfo;
use crate::services::document_client::build_http_client;
use crate::services::{ChatBackend, ChatClient, DocumentBackend, DocumentClient, Notifier};
use client_core::ApiError;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Controllers and clients for one user session.
pub struct AppState {
    pub settings: Settings,
    pub documents: Arc<dyn DocumentBackend>,
    pub notifier: Notifier,
    pub object_urls: ObjectUrlStore,
    pub preview: DocumentPreviewController,
    pub chat: Arc<ChatSessionController>,
    pub uploads: UploadTaskTracker,
    /// Seeds the chat once the opened document's collection is known.
    binder: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        documents: Arc<dyn DocumentBackend>,
        chat_backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let notifier = Notifier::new();
        let object_urls = ObjectUrlStore::new();

        let preview =
            DocumentPreviewController::new(documents.clone(), object_urls.clone(), &settings.preview);
        let chat = Arc::new(ChatSessionController::new(
            chat_backend,
            settings.chat.clone(),
            notifier.clone(),
        ));
        let uploads =
            UploadTaskTracker::new(documents.clone(), settings.upload.clone(), notifier.clone());

        Self {
            settings,
            documents,
            notifier,
            object_urls,
            preview,
            chat,
            uploads,
            binder: Mutex::new(None),
        }
    }

    /// Build the HTTP clients described by `settings` and wire everything to them.
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let client = build_http_client(&settings.backend)?;
        let documents = Arc::new(DocumentClient::with_client(
            client.clone(),
            settings.backend.clone(),
        ));
        let chat = Arc::new(ChatClient::with_client(client, settings.backend.clone()));
        Ok(Self::new(settings, documents, chat))
    }

    /// A pager over the document library using the configured page size.
    pub fn pager(&self) -> DocumentCollectionPager {
        DocumentCollectionPager::new(self.documents.clone(), &self.settings.library)
    }

    /// Select `document_id`: preview it and scope the chat to its collection.
    ///
    /// The chat is cleared immediately and reseeded once the document's
    /// metadata names its collection. Must be called from within a Tokio runtime.
    pub fn open_document(&self, document_id: impl Into<String>) {
        let document_id = document_id.into();

        self.chat.reset(String::new());
        self.preview.load(document_id.clone());

        let mut documents = self.preview.subscribe_document();
        let chat = Arc::downgrade(&self.chat);
        let binder = tokio::spawn(async move {
            let collection_name = match documents
                .wait_for(|doc| doc.as_ref().is_some_and(|doc| doc.id == document_id))
                .await
            {
                Ok(doc) => (*doc)
                    .as_ref()
                    .map(|doc| doc.collection_name.clone())
                    .unwrap_or_default(),
                Err(_) => return,
            };

            if let Some(chat) = chat.upgrade() {
                tracing::debug!(
                    document_id = %document_id,
                    collection_name = %collection_name,
                    "Scoping chat to document collection"
                );
                chat.reset(collection_name);
            }
        });

        let mut slot = self.binder.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = slot.replace(binder) {
            previous.abort();
        }
    }

    pub async fn collections(&self) -> Result<Vec<CollectionInfo>, ApiError> {
        self.documents.list_collections().await
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        let slot = self.binder.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(binder) = slot.take() {
            binder.abort();
        }
    }
}
