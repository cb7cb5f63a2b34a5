//! Core types, traits, and error definitions for Agent Mesh.
//!
//! This crate provides the building blocks shared by the routing, tool,
//! planning and model layers.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
