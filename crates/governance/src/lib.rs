//! Observability for Agent Mesh.
//!
//! This crate provides:
//! - Structured logging with optional OpenTelemetry export
//! - Prometheus metrics for forwarding and tool calls

pub mod metrics;
pub mod tracing_layer;

pub use metrics::{setup_metrics_recorder, track_forward, track_tool_call};
pub use tracing_layer::configure_tracing;
