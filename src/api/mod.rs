pub mod admin;

use crate::models::chat::{ ChatRequest, ChatResponse, ConversationList, HistoryResponse };
use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("connection failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// The REST surface of the chat backend consumed by the conversation client.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError>;

    async fn fetch_history(&self, conversation_id: &str) -> Result<HistoryResponse, BackendError>;

    async fn fetch_conversations(&self, user_id: &str) -> Result<ConversationList, BackendError>;

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: HttpClient,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(api_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let base_url = Url::parse(api_url).map_err(|e|
            BackendError::InvalidUrl(format!("{}: {}", api_url, e))
        )?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(api_url.to_string()));
        }
        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { http: builder.build()?, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins percent-encoded path segments onto the base URL, keeping any base path prefix.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)]
    ) -> Result<T, BackendError> {
        let mut url = self.endpoint(segments)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        read_json(resp).await
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(BackendError::Status(status.as_u16()));
    }
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        let url = self.endpoint(&["chat"])?;
        debug!("POST {} (conversation {})", url, request.conversation_id);
        let resp = self.http.post(url).json(request).send().await?;
        read_json(resp).await
    }

    async fn fetch_history(&self, conversation_id: &str) -> Result<HistoryResponse, BackendError> {
        self.get_json(&["history", conversation_id], &[]).await
    }

    async fn fetch_conversations(&self, user_id: &str) -> Result<ConversationList, BackendError> {
        self.get_json(&["conversations", user_id], &[]).await
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["conversations", conversation_id])?;
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).send().await?;
        if !resp.status().is_success() {
            return Err(BackendError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}
