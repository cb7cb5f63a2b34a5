//! Relays a resolved request to its downstream agent.
//!
//! Every outcome, including failures, becomes exactly one caller-visible
//! event. Errors never escape as `Err`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use agent_mesh_core::{
    config::RoutingConfig,
    types::{AgentDescriptor, AgentEvent, Message, MessageSendParams, RoutingDecision},
    Error,
};
use agent_mesh_governance::track_forward;

use crate::connection::ConnectionCache;
use crate::retry::RetryPolicy;

pub const NO_AGENT_MESSAGE: &str = "No agent available in registry.";

/// Result of forwarding one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardOutcome {
    /// The downstream agent answered; payload relayed verbatim.
    Delivered(Value),
    /// Resolution found no agent; nothing was sent.
    NoAgent,
    /// The downstream agent returned a protocol-level error.
    AgentError(String),
    /// Network failure, timeout or malformed response.
    TransportError(String),
    /// The inbound caller went away before the downstream call finished.
    Cancelled,
}

impl ForwardOutcome {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered(_) => "delivered",
            Self::NoAgent => "no_agent",
            Self::AgentError(_) => "agent_error",
            Self::TransportError(_) => "transport_error",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    /// The event handed back to the caller.
    pub fn into_event(self) -> AgentEvent {
        match self {
            Self::Delivered(payload) => AgentEvent::Payload(payload),
            Self::NoAgent => AgentEvent::text(NO_AGENT_MESSAGE),
            Self::AgentError(detail) => AgentEvent::text(format!("Agent error: {}", detail)),
            Self::TransportError(detail) => AgentEvent::text(format!("Host routing error: {}", detail)),
            Self::Cancelled => AgentEvent::text("Host routing error: request cancelled"),
        }
    }
}

/// Build the message sent downstream.
///
/// Role, parts, extensions and metadata are kept. Task, context and
/// reference ids are dropped so the target starts a new unit of work.
pub fn build_outbound(inbound: &Message) -> Message {
    let message_id = if inbound.message_id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        inbound.message_id.clone()
    };

    Message {
        role: inbound.role,
        parts: inbound.parts.clone(),
        message_id,
        metadata: inbound.metadata.clone(),
        reference_task_ids: None,
        task_id: None,
        context_id: None,
        extensions: inbound.extensions.clone(),
        kind: "message".to_string(),
    }
}

pub struct Forwarder {
    cache: Arc<ConnectionCache>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Forwarder {
    pub fn new(cache: Arc<ConnectionCache>, timeout: Duration) -> Self {
        Self {
            cache,
            timeout,
            retry: RetryPolicy::none(),
        }
    }

    pub fn from_config(cache: Arc<ConnectionCache>, config: &RoutingConfig) -> Self {
        Self::new(cache, config.request_timeout()).with_retry(RetryPolicy::from_config(&config.retry))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &Arc<ConnectionCache> {
        &self.cache
    }

    pub async fn forward(
        &self,
        decision: &RoutingDecision,
        inbound: &Message,
        metadata: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> ForwardOutcome {
        let Some(agent) = decision.agent() else {
            return ForwardOutcome::NoAgent;
        };

        let started = Instant::now();
        let outcome = self.forward_to(agent, inbound, metadata, cancel).await;
        track_forward(&agent.id, outcome.label(), started.elapsed());

        match &outcome {
            ForwardOutcome::Delivered(_) => {
                tracing::info!(agent_id = %agent.id, elapsed_ms = started.elapsed().as_millis() as u64, "Forwarded request");
            }
            other => {
                tracing::warn!(agent_id = %agent.id, outcome = other.label(), "Forwarding did not deliver");
            }
        }
        outcome
    }

    async fn forward_to(
        &self,
        agent: &AgentDescriptor,
        inbound: &Message,
        metadata: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> ForwardOutcome {
        let client = match self.cache.get(agent).await {
            Ok(client) => client,
            Err(e) => return ForwardOutcome::TransportError(e.to_string()),
        };

        let params = MessageSendParams {
            message: build_outbound(inbound),
            configuration: None,
            metadata,
        };

        let mut attempt = 1;
        loop {
            let send = tokio::time::timeout(self.timeout, client.send_message(params.clone()));
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ForwardOutcome::Cancelled,
                result = send => result.unwrap_or_else(|_| {
                    Err(Error::Timeout(format!(
                        "agent '{}' did not respond within {}s",
                        agent.id,
                        self.timeout.as_secs_f64()
                    )))
                }),
            };

            match result {
                Ok(payload) => return ForwardOutcome::Delivered(payload),
                Err(Error::Agent(detail)) => return ForwardOutcome::AgentError(detail),
                Err(e) if self.retry.should_retry(attempt, &e) => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        agent_id = %agent.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Forward attempt failed, retrying"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return ForwardOutcome::Cancelled,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return ForwardOutcome::TransportError(e.to_string()),
            }
        }
    }
}
