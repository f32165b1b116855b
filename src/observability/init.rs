//! Tracing subscriber setup.

use super::exporter;
use super::rotating::{RotatingFile, DEFAULT_BACKUPS, DEFAULT_MAX_BYTES};
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name of the live trace file inside the data directory.
pub const TRACE_FILE: &str = "roadguard-traces.jsonl";

/// Installs the global subscriber: an [`EnvFilter`] at `config.trace_level`
/// (default `info`) feeding an OpenTelemetry layer that writes finished spans
/// to [`TRACE_FILE`] in the plugin data directory.
///
/// Observability is optional: when the directory cannot be created nothing
/// is installed. Only the first call takes effect.
pub fn init_tracing(config: &Config) {
    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let data_dir = crate::infrastructure::paths::get_data_dir();
    if std::fs::create_dir_all(&data_dir).is_err() {
        return;
    }

    let resource = Resource::new(vec![
        opentelemetry::KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
        opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);

    let file = RotatingFile::new(data_dir.join(TRACE_FILE), DEFAULT_MAX_BYTES, DEFAULT_BACKUPS);
    let provider = exporter::create_tracer_provider(file, resource);
    let tracer = provider.tracer(env!("CARGO_PKG_NAME"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(OpenTelemetryLayer::new(tracer))
        .try_init();
}
