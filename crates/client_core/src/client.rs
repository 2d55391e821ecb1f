use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    error::ApiErrorBody,
    domain::SessionId,
    protocol::{
        ChatRequest, ChatSession, ClassifyIntentRequest, ConversationRequest,
        ConversationResponse, HealthStatus, IntentClassification, Message, ResearchRequest,
        ResearchResult,
    },
};
use tracing::{debug, warn};

use crate::{config::ClientSettings, error::ChatClientError};

/// The one remote operation the conversation store depends on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<Message, ChatClientError>;
}

/// Stateless wrapper over the research chat HTTP API. One call, one round trip.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ChatClientError::network)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ChatClientError> {
        Self::new(settings.base_url()?, settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<Message, ChatClientError> {
        debug!(
            "chat: request session={:?} history_len={}",
            request.session_id.as_ref().map(|id| id.as_str()),
            request.history.len()
        );
        self.send(self.request(Method::POST, "/api/chat").json(request), "/api/chat")
            .await
    }

    pub async fn classify_intent(
        &self,
        request: &ClassifyIntentRequest,
    ) -> Result<IntentClassification, ChatClientError> {
        self.send(
            self.request(Method::POST, "/api/classify-intent").json(request),
            "/api/classify-intent",
        )
        .await
    }

    pub async fn research(
        &self,
        request: &ResearchRequest,
    ) -> Result<ResearchResult, ChatClientError> {
        self.send(
            self.request(Method::POST, "/api/research").json(request),
            "/api/research",
        )
        .await
    }

    pub async fn conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<ConversationResponse, ChatClientError> {
        self.send(
            self.request(Method::POST, "/api/conversation").json(request),
            "/api/conversation",
        )
        .await
    }

    pub async fn get_session(
        &self,
        session_id: &SessionId,
    ) -> Result<ChatSession, ChatClientError> {
        let endpoint = session_endpoint(session_id, "");
        self.send(self.request(Method::GET, &endpoint), &endpoint)
            .await
    }

    /// Creates (or replaces) the server-side session stored under `session_id`.
    pub async fn create_session(
        &self,
        session_id: &SessionId,
    ) -> Result<ChatSession, ChatClientError> {
        let endpoint = session_endpoint(session_id, "");
        self.send(self.request(Method::POST, &endpoint), &endpoint)
            .await
    }

    pub async fn get_messages(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Message>, ChatClientError> {
        let endpoint = session_endpoint(session_id, "/messages");
        self.send(self.request(Method::GET, &endpoint), &endpoint)
            .await
    }

    pub async fn add_message(
        &self,
        session_id: &SessionId,
        message: &Message,
    ) -> Result<Message, ChatClientError> {
        let endpoint = session_endpoint(session_id, "/messages");
        debug!("sessions: add message session={session_id} message={}", message.id);
        self.send(self.request(Method::POST, &endpoint).json(message), &endpoint)
            .await
    }

    pub async fn health_check(&self) -> Result<HealthStatus, ChatClientError> {
        self.send(self.request(Method::GET, "/health"), "/health")
            .await
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{endpoint}", self.base_url))
    }

    async fn send<T>(&self, builder: RequestBuilder, endpoint: &str) -> Result<T, ChatClientError>
    where
        T: DeserializeOwned,
    {
        let res = builder.send().await.map_err(ChatClientError::network)?;
        let status = res.status();
        let body = res.bytes().await.map_err(ChatClientError::network)?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ApiErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.detail);
            let message = ApiErrorBody::message_for_status(detail.as_deref(), status.as_u16());
            warn!(
                "api: {endpoint} failed status={} message={message}",
                status.as_u16()
            );
            return Err(ChatClientError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        decode(endpoint, &body)
    }
}

fn session_endpoint(session_id: &SessionId, suffix: &str) -> String {
    format!("/api/sessions/{session_id}{suffix}")
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, ChatClientError> {
    serde_json::from_slice(body).map_err(|source| ChatClientError::MalformedResponse {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<Message, ChatClientError> {
        ChatClient::chat(self, &request).await
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
