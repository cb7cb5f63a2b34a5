//! A2A JSON-RPC client over HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use uuid::Uuid;

use agent_mesh_core::{
    traits::{AgentTransport, ClientFactory},
    types::{JsonRpcRequest, JsonRpcResponse, MessageSendParams},
    Error, Result,
};

/// Client bound to one downstream agent URL.
pub struct A2aClient {
    url: String,
    http: reqwest::Client,
}

impl A2aClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn map_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::transport(e.to_string())
    }
}

#[async_trait]
impl AgentTransport for A2aClient {
    async fn send_message(&self, params: MessageSendParams) -> Result<Value> {
        let request = JsonRpcRequest::new(
            Uuid::new_v4().to_string(),
            "message/send",
            serde_json::to_value(&params)?,
        );

        tracing::debug!(url = %self.url, message_id = %params.message.message_id, "Sending message/send");

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest)?;

        let parsed: JsonRpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(Error::transport(format!("Malformed response: {}", e)));
            }
            Err(_) => {
                return Err(Error::transport(format!("HTTP {}: {}", status.as_u16(), body)));
            }
        };

        if let Some(error) = parsed.error {
            return Err(Error::agent(error.message));
        }
        parsed
            .result
            .ok_or_else(|| Error::transport("Response carries neither result nor error"))
    }
}

/// Builds [`A2aClient`]s sharing one request timeout.
pub struct HttpClientFactory {
    timeout: Duration,
}

impl HttpClientFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, url: &str) -> Result<Arc<dyn AgentTransport>> {
        Ok(Arc::new(A2aClient::new(url, self.timeout)?))
    }
}
