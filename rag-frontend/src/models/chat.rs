//! Chat transcript model and the `/chat` wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of a chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique within a transcript, increasing in creation order.
    pub id: u64,
    pub role: Role,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Placeholder for an answer that has not arrived yet.
    pub is_pending: bool,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<SearchResult>>,
}

impl ChatMessage {
    fn new(id: u64, role: Role, text: String) -> Self {
        Self {
            id,
            role,
            text,
            created_at: Utc::now(),
            is_pending: false,
            is_error: false,
            citations: None,
        }
    }
}

/// Marks the request a session is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(Uuid);

impl RequestToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A conversation scoped to one collection.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub collection_name: String,
    pub transcript: Vec<ChatMessage>,
    pub in_flight: Option<RequestToken>,
    next_id: u64,
}

impl ChatSession {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            ..Default::default()
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Append a message and return its id.
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> u64 {
        let id = self.next_id();
        self.transcript.push(ChatMessage::new(id, role, text.into()));
        id
    }

    /// Append an empty assistant message flagged as pending.
    pub fn push_placeholder(&mut self) -> u64 {
        let id = self.next_id();
        let mut message = ChatMessage::new(id, Role::Assistant, String::new());
        message.is_pending = true;
        self.transcript.push(message);
        id
    }

    /// Replace the pending placeholder `id` in place. Returns false if it is gone.
    pub fn resolve_placeholder(
        &mut self,
        id: u64,
        text: String,
        citations: Option<Vec<SearchResult>>,
        is_error: bool,
    ) -> bool {
        let Some(message) = self.transcript.iter_mut().find(|m| m.id == id) else {
            return false;
        };

        message.text = text;
        message.citations = citations;
        message.is_error = is_error;
        message.is_pending = false;
        true
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.transcript.last()
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub collection_name: String,
    pub max_results: u32,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub page_content: String,
    #[serde(default)]
    pub page_number: Option<serde_json::Value>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Response of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub search_results: Vec<SearchResult>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub model_used: Option<String>,
}

/// Response of `GET /chat/{collection_name}/sample`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleQuestionsResponse {
    pub questions: Vec<String>,
}
