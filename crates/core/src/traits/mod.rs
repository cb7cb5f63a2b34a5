//! Core traits for Agent Mesh.
//!
//! Traits are organized by layer:
//! - `gateway`: routing (AgentTransport, ClientFactory, IntentClassifier, AgentExecutor)
//! - `skills`: tools (Tool, ToolSession)
//! - `llm`: model gateway (LlmClient)

pub mod gateway;
pub mod llm;
pub mod skills;

pub use gateway::*;
pub use llm::*;
pub use skills::*;
