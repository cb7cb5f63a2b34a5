//! Capability registry.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::Value;

use agent_mesh_core::{
    traits::Tool,
    types::{ToolDefinition, ToolOutput},
    Error, Result,
};

/// Name-indexed set of tools available to a planner.
#[derive(Default)]
pub struct CapabilityRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a batch of tools. Later duplicates are ignored.
    pub fn from_tools<I, T>(tools: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Tool + 'static,
    {
        let registry = Self::new();
        for tool in tools {
            if let Err(e) = registry.register(Arc::new(tool)) {
                tracing::warn!(error = %e, "Skipping duplicate tool");
            }
        }
        registry
    }

    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<()> {
        match self.tools.entry(tool.name().to_string()) {
            Entry::Occupied(entry) => Err(Error::internal(format!("Tool '{}' is already registered", entry.key()))),
            Entry::Vacant(entry) => {
                tracing::debug!(tool = %entry.key(), "Registering tool");
                entry.insert(tool);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| entry.value().clone())
    }

    /// Definitions sorted by name.
    pub fn list(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .iter()
            .map(|entry| ToolDefinition {
                name: entry.value().name().to_string(),
                description: entry.value().description().to_string(),
                parameters: entry.value().parameters(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<ToolOutput> {
        let tool = self.get(name).ok_or_else(|| Error::tool_not_found(name))?;
        tracing::debug!(tool = %name, "Executing tool");
        tool.execute(args).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
