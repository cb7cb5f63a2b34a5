//! Model gateway for Agent Mesh.
//!
//! Provides the Rig-backed [`RigLlmClient`] used by the planner.

pub mod rig_client;

pub use rig_client::{RigConfig, RigLlmClient};
