//! Routing layer traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{EventQueue, MessageSendParams, RequestContext};

/// A live client bound to one downstream agent URL.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Send one `message/send` request and return the result payload.
    async fn send_message(&self, params: MessageSendParams) -> Result<Value>;
}

/// Builds transports for the connection cache.
pub trait ClientFactory: Send + Sync {
    fn create(&self, url: &str) -> Result<Arc<dyn AgentTransport>>;
}

/// Coarse category of a free-text request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentCategory {
    /// The request needs a tool-using agent.
    ToolUse,
}

/// Classifier deciding whether free text maps to a known intent.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Option<IntentCategory>;
}

/// Handles inbound A2A requests for one agent role.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Process one request, publishing at least one event.
    async fn execute(&self, ctx: RequestContext, events: &EventQueue) -> Result<()>;

    /// Cancel an in-flight unit of work.
    async fn cancel(&self, ctx: RequestContext, events: &EventQueue) -> Result<()>;
}
