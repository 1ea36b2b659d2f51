//! Collection-scoped chat with at most one request in flight.

use crate::config::ChatSettings;
use crate::models::chat::{ChatRequest, ChatResponse, ChatSession, RequestToken, Role};
use crate::services::backend::ChatBackend;
use crate::services::metrics;
use crate::services::notifications::Notifier;
use client_core::ApiError;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Accepted range for `max_results` on `POST /chat`.
const MAX_RESULTS_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

pub struct ChatSessionController {
    shared: Arc<Shared>,
}

struct Shared {
    backend: Arc<dyn ChatBackend>,
    settings: ChatSettings,
    notifier: Notifier,
    session_tx: watch::Sender<ChatSession>,
    shutdown: CancellationToken,
}

impl ChatSessionController {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: ChatSettings, notifier: Notifier) -> Self {
        let (session_tx, _) = watch::channel(ChatSession::default());

        Self {
            shared: Arc::new(Shared {
                backend,
                settings,
                notifier,
                session_tx,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Ask `text` against `collection_name`.
    ///
    /// Returns the token of the started request, or `None` when the call was a
    /// no-op: blank text, empty collection, out-of-range parameters, or another
    /// request still in flight. Must be called from within a Tokio runtime.
    pub fn send(
        &self,
        text: &str,
        collection_name: &str,
        max_results: u32,
        model: &str,
    ) -> Option<RequestToken> {
        let query = text.trim();
        if query.is_empty() || collection_name.is_empty() {
            return None;
        }

        if query.chars().count() > self.shared.settings.max_query_chars {
            self.shared.notifier.error(format!(
                "Questions are limited to {} characters.",
                self.shared.settings.max_query_chars
            ));
            return None;
        }

        if !MAX_RESULTS_RANGE.contains(&max_results) {
            tracing::warn!(max_results, "Rejecting chat request with invalid max_results");
            return None;
        }

        let mut started = None;
        self.shared.session_tx.send_if_modified(|session| {
            if session.is_busy() {
                return false;
            }

            session.push(Role::User, query);
            let placeholder = session.push_placeholder();
            let token = RequestToken::new();
            session.in_flight = Some(token);
            started = Some((token, placeholder));
            true
        });

        let Some((token, placeholder)) = started else {
            tracing::debug!("Chat request already in flight, ignoring send");
            return None;
        };

        tracing::info!(
            token = %token,
            collection_name = %collection_name,
            max_results,
            model = %model,
            "Sending chat query"
        );

        let request = ChatRequest {
            query: query.to_string(),
            collection_name: collection_name.to_string(),
            max_results,
            model: model.to_string(),
        };

        let shared = Arc::downgrade(&self.shared);
        let backend = self.shared.backend.clone();
        let shutdown = self.shared.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                result = backend.query(request) => complete(shared, token, placeholder, result),
            }
        });

        Some(token)
    }

    /// `send` against the session's own collection with the configured defaults.
    pub fn ask(&self, text: &str) -> Option<RequestToken> {
        let collection_name = self.shared.session_tx.borrow().collection_name.clone();
        let settings = &self.shared.settings;
        self.send(text, &collection_name, settings.max_results, &settings.model)
    }

    /// Start over for `collection_name`: drop the transcript, abandon any
    /// pending request and seed the welcome message.
    pub fn reset(&self, collection_name: impl Into<String>) {
        let collection_name = collection_name.into();
        let welcome = self.shared.settings.welcome_message.clone();

        tracing::debug!(collection_name = %collection_name, "Resetting chat session");

        self.shared.session_tx.send_modify(|session| {
            *session = ChatSession::new(collection_name);
            session.push(Role::Assistant, welcome);
        });
    }

    pub fn session(&self) -> ChatSession {
        self.shared.session_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSession> {
        self.shared.session_tx.subscribe()
    }

    /// Wait until no request is in flight.
    pub async fn idle(&self) -> ChatSession {
        let mut rx = self.subscribe();
        let session = match rx.wait_for(|session| !session.is_busy()).await {
            Ok(session) => session.clone(),
            Err(_) => self.session(),
        };
        session
    }

    /// Suggested questions for the current collection. Failures yield an empty list.
    pub async fn sample_questions(&self, limit: u32) -> Vec<String> {
        let collection_name = self.shared.session_tx.borrow().collection_name.clone();
        if collection_name.is_empty() {
            return Vec::new();
        }

        match self
            .shared
            .backend
            .sample_questions(&collection_name, limit)
            .await
        {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!(
                    collection_name = %collection_name,
                    error = %e,
                    "Failed to load sample questions"
                );
                Vec::new()
            }
        }
    }
}

impl Drop for ChatSessionController {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

fn complete(
    shared: Weak<Shared>,
    token: RequestToken,
    placeholder: u64,
    result: Result<ChatResponse, ApiError>,
) {
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let mut failure = None;
    let applied = shared.session_tx.send_if_modified(|session| {
        if session.in_flight != Some(token) {
            return false;
        }
        session.in_flight = None;

        match result {
            Ok(response) => {
                let citations =
                    (!response.search_results.is_empty()).then_some(response.search_results);
                session.resolve_placeholder(placeholder, response.answer, citations, false);
            }
            Err(e) => {
                session.resolve_placeholder(placeholder, e.user_message().to_string(), None, true);
                failure = Some(e);
            }
        }
        true
    });

    if !applied {
        tracing::debug!(token = %token, "Discarding chat response for abandoned request");
        metrics::record_chat_query("stale");
        return;
    }

    match failure {
        None => {
            tracing::info!(token = %token, "Chat answer received");
            metrics::record_chat_query("answered");
        }
        Some(e) => {
            tracing::warn!(token = %token, kind = e.kind(), error = %e, "Chat query failed");
            metrics::record_chat_query(e.kind());
            shared
                .notifier
                .error(format!("Chat request failed: {}", e.user_message()));
        }
    }
}
