//! Mock implementations of core traits for testing.
//!
//! Shared by unit and integration tests across the workspace.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::{
    traits::{
        AgentTransport, ChatMessage, ClientFactory, LlmClient, LlmResponse, ToolConnector, ToolSession,
    },
    types::{CallToolResult, MessageSendParams, ResourceDescriptor, ToolDescriptor},
    Error, Result,
};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Mock LLM Client
// =============================================================================

/// Scripted mock LLM. Responses are returned in order; the last one repeats.
pub struct MockLlm {
    responses: Vec<String>,
    call_count: AtomicUsize,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlm {
    /// Create a new mock LLM with a queue of responses.
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            call_count: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Get the number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every chat transcript received, in call order.
    pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.transcripts).clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        self.chat(&[ChatMessage::user(prompt)]).await
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
        lock(&self.transcripts).push(messages.to_vec());
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        let content = self
            .responses
            .get(idx)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_else(|| "FINAL ANSWER: Done".to_string());
        Ok(LlmResponse::text(content))
    }
}

// =============================================================================
// Mock Tool Session
// =============================================================================

/// In-memory tool server session that records every call.
#[derive(Default)]
pub struct MockToolSession {
    tools: Vec<ToolDescriptor>,
    results: Mutex<Map<String, Value>>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
    closed: AtomicUsize,
    fail_listing: bool,
}

impl MockToolSession {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            ..Default::default()
        }
    }

    /// A session whose `list_tools` always fails.
    pub fn unavailable() -> Self {
        Self {
            fail_listing: true,
            ..Default::default()
        }
    }

    /// Script the raw `tools/call` result for `tool`.
    pub fn with_result(self, tool: &str, result: CallToolResult) -> Self {
        let value = serde_json::to_value(result).unwrap_or(Value::Null);
        lock(&self.results).insert(tool.to_string(), value);
        self
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        lock(&self.calls).clone()
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSession for MockToolSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        if self.fail_listing {
            return Err(Error::transport("connection refused"));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult> {
        lock(&self.calls).push((name.to_string(), arguments.clone()));
        match lock(&self.results).get(name) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Ok(CallToolResult::text(format!("{name} called with {}", Value::Object(arguments)))),
        }
    }

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out one shared [`MockToolSession`].
pub struct MockToolConnector {
    session: Option<Arc<MockToolSession>>,
    urls: Mutex<Vec<String>>,
}

impl MockToolConnector {
    pub fn new(session: Arc<MockToolSession>) -> Self {
        Self {
            session: Some(session),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// A connector whose server is down.
    pub fn unreachable() -> Self {
        Self {
            session: None,
            urls: Mutex::new(Vec::new()),
        }
    }

    /// URLs passed to `connect`, in order.
    pub fn urls(&self) -> Vec<String> {
        lock(&self.urls).clone()
    }
}

#[async_trait]
impl ToolConnector for MockToolConnector {
    async fn connect(&self, server_url: &str) -> Result<Arc<dyn ToolSession>> {
        lock(&self.urls).push(server_url.to_string());
        match &self.session {
            Some(session) => Ok(session.clone()),
            None => Err(Error::transport(format!("connection refused: {server_url}"))),
        }
    }
}

// =============================================================================
// Mock Agent Transport
// =============================================================================

/// Scripted downstream agent.
pub struct MockTransport {
    reply: Result<Value>,
    delay: Option<Duration>,
    sent: Mutex<Vec<MessageSendParams>>,
}

impl MockTransport {
    /// Replies with an agent text message.
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(json!({
                "kind": "message",
                "role": "agent",
                "messageId": "reply-1",
                "parts": [{"kind": "text", "text": text}]
            })),
            delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Fails every send with `error`.
    pub fn failing(error: Error) -> Self {
        Self {
            reply: Err(error),
            delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<MessageSendParams> {
        lock(&self.sent).clone()
    }
}

fn clone_result(result: &Result<Value>) -> Result<Value> {
    match result {
        Ok(value) => Ok(value.clone()),
        Err(Error::Transport(msg)) => Err(Error::Transport(msg.clone())),
        Err(Error::Agent(msg)) => Err(Error::Agent(msg.clone())),
        Err(Error::Timeout(msg)) => Err(Error::Timeout(msg.clone())),
        Err(other) => Err(Error::internal(other.to_string())),
    }
}

#[async_trait]
impl AgentTransport for MockTransport {
    async fn send_message(&self, params: MessageSendParams) -> Result<Value> {
        lock(&self.sent).push(params);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        clone_result(&self.reply)
    }
}

/// Client factory handing out one shared transport and counting constructions.
pub struct MockClientFactory {
    transport: Arc<MockTransport>,
    created: AtomicUsize,
}

impl MockClientFactory {
    pub fn new(transport: MockTransport) -> Self {
        Self {
            transport: Arc::new(transport),
            created: AtomicUsize::new(0),
        }
    }

    pub fn transport(&self) -> Arc<MockTransport> {
        self.transport.clone()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockClientFactory {
    fn create(&self, _url: &str) -> Result<Arc<dyn AgentTransport>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.transport.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_llm_repeats_last() {
        let llm = MockLlm::new(vec!["one".into(), "two".into()]);
        assert_eq!(llm.complete("a").await.unwrap().content, "one");
        assert_eq!(llm.complete("b").await.unwrap().content, "two");
        assert_eq!(llm.complete("c").await.unwrap().content, "two");
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_session_records_calls() {
        let session = MockToolSession::new(vec![ToolDescriptor::new("echo", "Echo")])
            .with_result("echo", CallToolResult::text("hi"));
        let mut args = Map::new();
        args.insert("message".into(), json!("hi"));

        let result = session.call_tool("echo", args).await.unwrap();
        assert_eq!(result.text_content(), "hi");
        assert_eq!(session.calls().len(), 1);
    }
}
