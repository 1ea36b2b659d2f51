//! Ownership of in-memory resource handles (object URLs).
//!
//! [`ObjectUrlStore`] plays the part of the browser's object-URL table: it maps
//! a `blob:` URL to the bytes behind it for as long as the URL is not revoked.
//! A [`ResourceHandle`] owns exactly one such URL and revokes it when dropped,
//! so release happens on every exit path without call-site bookkeeping.

use crate::models::preview::{ObjectUrl, PreviewResource};
use crate::services::metrics;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;

/// Shared table of live object URLs.
#[derive(Clone, Default)]
pub struct ObjectUrlStore {
    entries: Arc<DashMap<ObjectUrl, Bytes>>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&self, data: Bytes) -> ObjectUrl {
        let url = ObjectUrl::generate();
        self.entries.insert(url.clone(), data);
        metrics::object_url_created();
        url
    }

    fn revoke(&self, url: &ObjectUrl) -> bool {
        let removed = self.entries.remove(url).is_some();
        if removed {
            metrics::object_url_revoked();
        }
        removed
    }

    /// Bytes behind `url`, or `None` once it has been revoked.
    pub fn resolve(&self, url: &ObjectUrl) -> Option<Bytes> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    pub fn is_live(&self, url: &ObjectUrl) -> bool {
        self.entries.contains_key(url)
    }

    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}

/// Owned object URL. Revoked exactly once, when the handle is dropped.
pub struct ResourceHandle {
    url: ObjectUrl,
    size_bytes: u64,
    mime_hint: String,
    store: ObjectUrlStore,
}

impl ResourceHandle {
    pub fn url(&self) -> &ObjectUrl {
        &self.url
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn describe(&self) -> PreviewResource {
        PreviewResource {
            handle: self.url.clone(),
            size_bytes: self.size_bytes,
            mime_hint: self.mime_hint.clone(),
        }
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        if self.store.revoke(&self.url) {
            tracing::debug!(url = %self.url, "Object URL revoked");
        }
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("url", &self.url)
            .field("size_bytes", &self.size_bytes)
            .field("mime_hint", &self.mime_hint)
            .finish()
    }
}

/// Holds zero or one live handle for a single consumer.
pub struct ResourceHandleRegistry {
    store: ObjectUrlStore,
    current: Option<ResourceHandle>,
}

impl ResourceHandleRegistry {
    pub fn new(store: ObjectUrlStore) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Wrap `data` in a fresh handle, releasing the previous one first.
    pub fn acquire(&mut self, data: Bytes, mime_hint: &str) -> &ResourceHandle {
        self.release();

        let size_bytes = data.len() as u64;
        let url = self.store.create(data);
        tracing::debug!(url = %url, size_bytes, "Object URL created");

        self.current.insert(ResourceHandle {
            url,
            size_bytes,
            mime_hint: mime_hint.to_string(),
            store: self.store.clone(),
        })
    }

    /// Release the held handle, if any. Returns whether one was held.
    pub fn release(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn current(&self) -> Option<&ResourceHandle> {
        self.current.as_ref()
    }

    pub fn store(&self) -> &ObjectUrlStore {
        &self.store
    }
}
