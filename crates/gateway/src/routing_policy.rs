//! Agent resolution as an ordered list of named strategies.
//!
//! Each strategy either picks an agent, settles on "no agent", or defers to
//! the next one. The first strategy that does not defer wins.

use std::sync::Arc;

use agent_mesh_core::config::RoutingConfig;
use agent_mesh_core::traits::{IntentCategory, IntentClassifier};
use agent_mesh_core::types::{AgentDescriptor, RoutingDecision, RoutingRequest};

use crate::registry::RegistrySnapshot;
use crate::router::KeywordIntentClassifier;

/// Result of a single strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Agent(&'a AgentDescriptor),
    NoAgent,
    Continue,
}

/// One step of the resolution chain.
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve<'a>(&self, snapshot: &'a RegistrySnapshot, request: &RoutingRequest) -> Resolution<'a>;
}

/// An explicit agent id is authoritative; an unknown id means no agent.
pub struct ExplicitAgent;

impl ResolutionStrategy for ExplicitAgent {
    fn name(&self) -> &'static str {
        "agent_id"
    }

    fn resolve<'a>(&self, snapshot: &'a RegistrySnapshot, request: &RoutingRequest) -> Resolution<'a> {
        match request.agent_id.as_deref() {
            Some(id) => snapshot.by_id(id).map_or(Resolution::NoAgent, Resolution::Agent),
            None => Resolution::Continue,
        }
    }
}

/// First agent, in registry order, with a skill carrying the tag.
pub struct SkillTag;

impl ResolutionStrategy for SkillTag {
    fn name(&self) -> &'static str {
        "skill_tag"
    }

    fn resolve<'a>(&self, snapshot: &'a RegistrySnapshot, request: &RoutingRequest) -> Resolution<'a> {
        let Some(tag) = request.skill_tag.as_deref() else {
            return Resolution::Continue;
        };
        snapshot
            .list()
            .find(|agent| agent.has_skill_tag(tag))
            .map_or(Resolution::Continue, Resolution::Agent)
    }
}

/// Free text classified as tool use goes to the reserved tool agent, if present.
pub struct ToolIntent {
    classifier: Arc<dyn IntentClassifier>,
    tool_agent_id: String,
}

impl ToolIntent {
    pub fn new(classifier: Arc<dyn IntentClassifier>, tool_agent_id: impl Into<String>) -> Self {
        Self {
            classifier,
            tool_agent_id: tool_agent_id.into(),
        }
    }
}

impl ResolutionStrategy for ToolIntent {
    fn name(&self) -> &'static str {
        "intent"
    }

    fn resolve<'a>(&self, snapshot: &'a RegistrySnapshot, request: &RoutingRequest) -> Resolution<'a> {
        let Some(text) = request.user_message.as_deref() else {
            return Resolution::Continue;
        };
        match self.classifier.classify(text) {
            Some(IntentCategory::ToolUse) => snapshot
                .by_id(&self.tool_agent_id)
                .map_or(Resolution::Continue, Resolution::Agent),
            None => Resolution::Continue,
        }
    }
}

/// First enabled agent in registry order.
pub struct DefaultAgent;

impl ResolutionStrategy for DefaultAgent {
    fn name(&self) -> &'static str {
        "default"
    }

    fn resolve<'a>(&self, snapshot: &'a RegistrySnapshot, _request: &RoutingRequest) -> Resolution<'a> {
        snapshot.list().next().map_or(Resolution::NoAgent, Resolution::Agent)
    }
}

/// Stateless resolver. Same snapshot and request always give the same decision.
pub struct Resolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl Resolver {
    /// Build the standard chain: explicit id, skill tag, intent, default.
    pub fn new(classifier: Arc<dyn IntentClassifier>, tool_agent_id: impl Into<String>) -> Self {
        Self::with_strategies(vec![
            Box::new(ExplicitAgent),
            Box::new(SkillTag),
            Box::new(ToolIntent::new(classifier, tool_agent_id)),
            Box::new(DefaultAgent),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        let classifier = KeywordIntentClassifier::from_config(config);
        Self::new(Arc::new(classifier), config.tool_agent_id.clone())
    }

    /// Strategy names in evaluation order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, snapshot: &RegistrySnapshot, request: &RoutingRequest) -> RoutingDecision {
        if snapshot.is_empty() {
            tracing::debug!("Registry is empty, no agent available");
            return RoutingDecision::NoAgent;
        }

        for strategy in &self.strategies {
            match strategy.resolve(snapshot, request) {
                Resolution::Agent(agent) => {
                    tracing::debug!(agent_id = %agent.id, strategy = strategy.name(), "Resolved agent");
                    return RoutingDecision::Routed {
                        agent: agent.clone(),
                        strategy: strategy.name(),
                    };
                }
                Resolution::NoAgent => {
                    tracing::debug!(strategy = strategy.name(), "Resolution settled on no agent");
                    return RoutingDecision::NoAgent;
                }
                Resolution::Continue => {}
            }
        }
        RoutingDecision::NoAgent
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}
