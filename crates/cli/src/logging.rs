//! Tracing subscriber setup
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use crate::config::LogFormat;
use crate::telemetry;
use anyhow::{Context, Result};
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "posting_ledger=info";

/// Layers stacked on top of the filtered registry
pub type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

pub fn init(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    match format {
        // Production: JSON structured logging
        LogFormat::Json => layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed()),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed(),
        ),
    }
    if let Some(otel) = telemetry::layer()? {
        layers.push(otel);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .context("Failed to install tracing subscriber")
}
