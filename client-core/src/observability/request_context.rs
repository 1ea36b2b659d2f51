//! Request correlation for outbound calls.
//!
//! Every request sent through [`TracedRequest`] carries an `x-request-id`
//! header so client and server logs can be joined on it.

use reqwest::header::HeaderMap;
use tracing::Instrument;

/// Header name for request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Insert a fresh UUID v4 request ID into the given headers and return it.
fn inject_request_id(headers: &mut HeaderMap) -> String {
    let id = uuid::Uuid::new_v4().to_string();

    if let Ok(value) = id.parse() {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    id
}

/// Wraps reqwest's RequestBuilder to inject a request ID on send.
pub struct TracedRequest {
    request: reqwest::RequestBuilder,
    method: &'static str,
    url: String,
}

impl TracedRequest {
    fn new(request: reqwest::RequestBuilder, method: &'static str, url: &str) -> Self {
        Self {
            request,
            method,
            url: url.to_string(),
        }
    }

    /// Add query parameters; values are URL-encoded.
    pub fn query<T: serde::Serialize + ?Sized>(self, query: &T) -> Self {
        Self {
            request: self.request.query(query),
            ..self
        }
    }

    /// Add JSON body to the request.
    pub fn json<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        Self {
            request: self.request.json(json),
            ..self
        }
    }

    /// Attach a multipart form body.
    pub fn multipart(self, form: reqwest::multipart::Form) -> Self {
        Self {
            request: self.request.multipart(form),
            ..self
        }
    }

    /// Send the request with a fresh request ID.
    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        let id = inject_request_id(&mut headers);

        let span = tracing::debug_span!(
            "http_request",
            method = self.method,
            url = %self.url,
            request_id = %id
        );

        async move {
            let result = self.request.headers(headers).send().await;
            match &result {
                Ok(response) => tracing::debug!(status = %response.status(), "Response received"),
                Err(e) => tracing::debug!(error = %e, "Request failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Extension trait for reqwest::Client to create traced requests.
pub trait TracedClientExt {
    fn traced_get(&self, url: &str) -> TracedRequest;
    fn traced_post(&self, url: &str) -> TracedRequest;
    fn traced_delete(&self, url: &str) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced_get(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.get(url), "GET", url)
    }

    fn traced_post(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.post(url), "POST", url)
    }

    fn traced_delete(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.delete(url), "DELETE", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_generates_id() {
        let mut headers = HeaderMap::new();
        let id = inject_request_id(&mut headers);
        assert_eq!(headers.get(REQUEST_ID_HEADER).unwrap(), id.as_str());
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
