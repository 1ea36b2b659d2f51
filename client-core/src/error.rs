use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure taxonomy for every call the client makes against the backend.
///
/// The payload of each variant is technical detail meant for logs. What a
/// user gets to see comes from [`ApiError::user_message`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// FastAPI error body, `{"detail": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Short message that is safe to show in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::NetworkUnreachable(_) => {
                "Unable to reach the server. Check your connection and try again."
            }
            ApiError::NotFound(_) => "The requested document could not be found.",
            ApiError::Forbidden(_) => "You do not have permission to access this document.",
            ApiError::ServerError { .. } => "The server encountered an error. Please try again.",
            ApiError::Timeout(_) => "The request took too long to complete.",
            ApiError::InvalidContent(_) => "The document is empty or could not be read.",
            ApiError::Unknown(_) => "Something went wrong. Please try again.",
        }
    }

    /// Transient failures are worth retrying; the rest will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::NetworkUnreachable(_) | ApiError::Timeout(_) | ApiError::ServerError { .. }
        )
    }

    /// Short stable label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NetworkUnreachable(_) => "network_unreachable",
            ApiError::NotFound(_) => "not_found",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::ServerError { .. } => "server_error",
            ApiError::Timeout(_) => "timeout",
            ApiError::InvalidContent(_) => "invalid_content",
            ApiError::Unknown(_) => "unknown",
        }
    }

    /// Map a non-success HTTP status and its body to the taxonomy.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = detail_from_body(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

        match status.as_u16() {
            404 => ApiError::NotFound(message),
            401 | 403 => ApiError::Forbidden(message),
            408 | 504 => ApiError::Timeout(message),
            code @ 500..=599 => ApiError::ServerError {
                status: code,
                message,
            },
            code => ApiError::Unknown(format!("HTTP {}: {}", code, message)),
        }
    }

    /// Read the status and body of a response, returning it untouched on success.
    pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}

fn detail_from_body(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_connect() {
            ApiError::NetworkUnreachable(err.to_string())
        } else if err.is_decode() {
            ApiError::InvalidContent(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status, "")
        } else if err.is_request() {
            ApiError::NetworkUnreachable(err.to_string())
        } else {
            ApiError::Unknown(err.to_string())
        }
    }
}
