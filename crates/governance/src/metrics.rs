//! Metrics implementation using Prometheus.

use std::time::Duration;

use agent_mesh_core::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Record one forwarded request and its latency.
pub fn track_forward(agent: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "agent_mesh_forward_total",
        "agent" => agent.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!(
        "agent_mesh_forward_duration_seconds",
        "agent" => agent.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Record one remote tool invocation.
pub fn track_tool_call(tool: &str, outcome: &'static str) {
    metrics::counter!(
        "agent_mesh_tool_calls_total",
        "tool" => tool.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_without_recorder_is_noop() {
        track_forward("a", "delivered", Duration::from_millis(5));
        track_tool_call("echo", "ok");
    }
}
