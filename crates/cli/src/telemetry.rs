//! OpenTelemetry export for the tracing pipeline
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: Service name (default: posting-ledger)
//!
//! ```text
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
//!     posting-ledger archive
//! ```

use crate::logging::BoxedLayer;
use anyhow::Result;

/// Build the OTLP layer when an endpoint is configured
pub fn layer() -> Result<Option<BoxedLayer>> {
    match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => otlp_layer(&endpoint),
        Err(_) => Ok(None),
    }
}

#[cfg(not(feature = "telemetry"))]
fn otlp_layer(endpoint: &str) -> Result<Option<BoxedLayer>> {
    // Subscriber is not installed yet
    eprintln!(
        "OTEL_EXPORTER_OTLP_ENDPOINT={} set but feature 'telemetry' not enabled; rebuild with --features telemetry",
        endpoint
    );
    Ok(None)
}

#[cfg(feature = "telemetry")]
fn otlp_layer(endpoint: &str) -> Result<Option<BoxedLayer>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};
    use tracing_subscriber::Layer;

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "posting-ledger".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();

    let tracer = provider.tracer(service_name);
    opentelemetry::global::set_tracer_provider(provider);

    Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer).boxed()))
}

/// Flush pending spans before exit
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
