//! Logging and distributed tracing setup.

use agent_mesh_core::{Error, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,agent_mesh=debug";

/// Install the global subscriber: env filter, stderr (plain or JSON) and,
/// when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OTLP exporter.
pub fn configure_tracing(service_name: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // stderr keeps stdout free for command output.
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer);

    let init = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) if !endpoint.trim().is_empty() => {
            let tracer_provider = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint.clone()),
                )
                .with_trace_config(
                    sdktrace::config().with_resource(Resource::new(vec![KeyValue::new(
                        "service.name",
                        service_name.to_string(),
                    )])),
                )
                .install_batch(runtime::Tokio)
                .map_err(|e| Error::internal(format!("Failed to install OTLP pipeline: {}", e)))?;
            let tracer = tracer_provider.tracer("opentelemetry-otlp");

            let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            let result = registry.with(otel_layer).try_init();
            tracing::info!(endpoint = %endpoint, service = service_name, "OpenTelemetry tracing enabled");
            result
        }
        _ => registry.try_init(),
    };

    init.map_err(|e| Error::internal(format!("Failed to install tracing subscriber: {}", e)))
}
