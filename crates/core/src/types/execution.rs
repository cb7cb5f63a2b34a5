use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::message::Message;

// =============================================================================
// Execution Context
// =============================================================================

/// Everything an executor knows about one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub message: Message,
    pub metadata: Option<Map<String, Value>>,
    pub task_id: Option<String>,
    pub context_id: Option<String>,
    /// Cancelled when the client goes away or the server shuts down.
    pub cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(message: Message) -> Self {
        Self {
            task_id: message.task_id.clone(),
            context_id: message.context_id.clone(),
            message,
            metadata: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Option<Map<String, Value>>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Text of the inbound message, `None` when blank.
    pub fn user_input(&self) -> Option<String> {
        let text = self.message.text_content();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// An event produced by an executor for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A downstream payload relayed as-is.
    Payload(Value),
    /// A message authored by this agent.
    Message(Message),
}

impl AgentEvent {
    pub fn text(text: impl Into<String>) -> Self {
        AgentEvent::Message(Message::agent_text(text))
    }

    pub fn into_value(self) -> Value {
        match self {
            AgentEvent::Payload(value) => value,
            AgentEvent::Message(message) => serde_json::to_value(message).unwrap_or(Value::Null),
        }
    }
}

/// Sink for executor events. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: mpsc::UnboundedSender<AgentEvent>,
}

impl EventQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish an event. Silently dropped when the receiver is gone.
    pub fn enqueue(&self, event: AgentEvent) {
        let _ = self.tx.send(event);
    }
}
