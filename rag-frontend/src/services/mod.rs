pub mod backend;
pub mod chat_client;
pub mod document_client;
pub mod metrics;
pub mod notifications;

pub use backend::{ChatBackend, DocumentBackend, ProgressFn};
pub use chat_client::ChatClient;
pub use document_client::DocumentClient;
pub use notifications::{Notification, NotificationLevel, Notifier};
