use crate::config::BackendSettings;
use crate::models::chat::{ChatRequest, ChatResponse, SampleQuestionsResponse};
use crate::services::backend::ChatBackend;
use crate::services::document_client::{build_http_client, endpoint};
use anyhow::Result;
use async_trait::async_trait;
use client_core::observability::TracedClientExt;
use client_core::ApiError;
use reqwest::Client;

/// Client for the collection-scoped `/chat` endpoints.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    settings: BackendSettings,
}

impl ChatClient {
    pub fn new(settings: BackendSettings) -> Result<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: BackendSettings) -> Self {
        Self { client, settings }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn query(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        let url = self.url("/chat");

        let response = self
            .client
            .traced_post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    collection_name = %request.collection_name,
                    error = %e,
                    "Chat request failed"
                );
                ApiError::from(e)
            })?;
        let response = ApiError::check_response(response).await?;

        Ok(response.json::<ChatResponse>().await?)
    }

    async fn sample_questions(
        &self,
        collection_name: &str,
        limit: u32,
    ) -> Result<Vec<String>, ApiError> {
        let url = endpoint(&self.settings.url, &["chat", collection_name, "sample"])?;

        let response = self
            .client
            .traced_get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let response = ApiError::check_response(response).await?;

        Ok(response.json::<SampleQuestionsResponse>().await?.questions)
    }
}
