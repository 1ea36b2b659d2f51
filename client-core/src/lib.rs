//! client-core: Shared infrastructure for the RAG chat client.
pub mod config;
pub mod error;
pub mod observability;
pub mod retry;

pub use error::ApiError;
pub use retry::{retry_call, RetryConfig};
