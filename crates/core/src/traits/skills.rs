//! Tool layer traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::{CallToolResult, ResourceDescriptor, ToolDescriptor, ToolOutput};

/// Tool interface handed to a planner.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the unique name of the tool.
    fn name(&self) -> &str;

    /// Get the human-readable description.
    fn description(&self) -> &str;

    /// Get the JSON Schema for parameters.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value) -> Result<ToolOutput>;
}

/// An open session with a remote tool server.
#[async_trait]
pub trait ToolSession: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult>;

    async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>> {
        Ok(Vec::new())
    }

    async fn read_resource(&self, uri: &str) -> Result<Value> {
        Err(crate::Error::unsupported(format!("read_resource({uri})")))
    }

    /// Release the session. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

/// Opens sessions against a tool server.
#[async_trait]
pub trait ToolConnector: Send + Sync {
    async fn connect(&self, server_url: &str) -> Result<Arc<dyn ToolSession>>;
}
