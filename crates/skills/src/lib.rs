//! Tool layer for Agent Mesh.
//!
//! This crate provides:
//! - MCP server registry and URL resolution
//! - Streamable-HTTP MCP session client
//! - Tool discovery
//! - Schema normalization and the capability adapter
//! - Capability registry

pub mod capability;
pub mod discovery;
pub mod mcp_client;
pub mod mcp_registry;
pub mod registry;
pub mod schema;

pub use capability::{build_capabilities, ArgumentValidator, Capability};
pub use discovery::ToolDiscovery;
pub use mcp_client::{with_session, McpHttpConnector, McpSession};
pub use mcp_registry::{resolve_server_url, server_url_from_config, McpServerRegistry, DEFAULT_MCP_URL};
pub use registry::CapabilityRegistry;
pub use schema::{
    DeclaredSchema, FallbackTable, NormalizedSchema, ParamSpec, ParamType, SchemaNormalizer, SchemaSource,
};
