//! Core type definitions for Agent Mesh.
//!
//! Split by concern: registry entries and cards, A2A messages, JSON-RPC
//! envelopes, routing hints, tool descriptors and execution context.

pub mod agent;
pub mod execution;
pub mod jsonrpc;
pub mod message;
pub mod routing;
pub mod tool;

pub use agent::*;
pub use execution::*;
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use message::*;
pub use routing::*;
pub use tool::*;
