use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::agent::AgentDescriptor;

// =============================================================================
// Routing Types
// =============================================================================

/// Metadata key carrying an explicit target agent id.
pub const AGENT_ID_KEY: &str = "agent_id";
/// Metadata key carrying a skill tag hint.
pub const SKILL_TAG_KEY: &str = "skill_tag";

/// Routing hints for one inbound request. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRequest {
    pub agent_id: Option<String>,
    pub skill_tag: Option<String>,
    pub user_message: Option<String>,
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl RoutingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_skill_tag(mut self, skill_tag: impl Into<String>) -> Self {
        self.skill_tag = Some(skill_tag.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = Some(message.into());
        self
    }

    /// Extract hints from inbound request metadata. Blank values count as absent.
    pub fn from_metadata(metadata: Option<&Map<String, Value>>, user_message: Option<String>) -> Self {
        Self {
            agent_id: non_empty(metadata.and_then(|m| m.get(AGENT_ID_KEY))),
            skill_tag: non_empty(metadata.and_then(|m| m.get(SKILL_TAG_KEY))),
            user_message: user_message.filter(|m| !m.trim().is_empty()),
        }
    }
}

/// Outcome of one resolution pass. Consumed immediately by the forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// An agent was chosen by the named strategy.
    Routed {
        agent: AgentDescriptor,
        strategy: &'static str,
    },
    /// No agent is available for this request.
    NoAgent,
}

impl RoutingDecision {
    pub fn agent(&self) -> Option<&AgentDescriptor> {
        match self {
            Self::Routed { agent, .. } => Some(agent),
            Self::NoAgent => None,
        }
    }
}
