//! Span exporter writing one compact JSON object per finished span.
//!
//! ```json
//! {"ts":"2026-10-19T08:12:03.120Z","trace_id":"…","span_id":"…","parent_span_id":"…",
//!  "name":"handle_event","duration_us":412,"status":"unset",
//!  "attributes":{"event_type":"Input"},"events":2,"service":"roadguard-moderator"}
//! ```

use super::rotating::RotatingFile;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use opentelemetry::trace::{SpanId, Status, TraceError};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Serialize)]
struct SpanRecord {
    ts: String,
    trace_id: String,
    span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_span_id: Option<String>,
    name: String,
    duration_us: u128,
    status: String,
    attributes: Map<String, JsonValue>,
    events: usize,
    service: String,
}

/// Writes finished spans to a [`RotatingFile`].
struct JsonLinesExporter {
    file: RotatingFile,
    service: String,
    is_shutdown: AtomicBool,
}

impl JsonLinesExporter {
    fn record(&self, span: &SpanData) -> SpanRecord {
        let started: DateTime<Utc> = span.start_time.into();
        let duration_us = span
            .end_time
            .duration_since(span.start_time)
            .map_or(0, |d| d.as_micros());

        SpanRecord {
            ts: started.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            trace_id: format!("{:032x}", span.span_context.trace_id()),
            span_id: format!("{:016x}", span.span_context.span_id()),
            parent_span_id: (span.parent_span_id != SpanId::INVALID)
                .then(|| format!("{:016x}", span.parent_span_id)),
            name: span.name.to_string(),
            duration_us,
            status: match &span.status {
                Status::Unset => "unset".to_string(),
                Status::Ok => "ok".to_string(),
                Status::Error { description } => format!("error: {description}"),
            },
            attributes: attributes_to_json(&span.attributes),
            events: span.events.len(),
            service: self.service.clone(),
        }
    }
}

impl SpanExporter for JsonLinesExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Box::pin(std::future::ready(Err(TraceError::from("exporter is shut down"))));
        }

        for span in &batch {
            let line = match serde_json::to_string(&self.record(span)) {
                Ok(line) => line,
                Err(e) => return Box::pin(std::future::ready(Err(TraceError::from(e.to_string())))),
            };
            if let Err(e) = self.file.write_line(&line) {
                return Box::pin(std::future::ready(Err(TraceError::from(e.to_string()))));
            }
        }

        Box::pin(std::future::ready(Ok(())))
    }

    fn shutdown(&mut self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }

    fn set_resource(&mut self, res: &Resource) {
        if let Some(name) = res.get(opentelemetry::Key::from_static_str("service.name")) {
            self.service = name.to_string();
        }
    }
}

impl std::fmt::Debug for JsonLinesExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesExporter")
            .field("file", &self.file)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Flattens span attributes into a JSON object, keeping numbers and booleans
/// typed.
fn attributes_to_json(attributes: &[KeyValue]) -> Map<String, JsonValue> {
    attributes
        .iter()
        .map(|kv| {
            let value = match &kv.value {
                Value::Bool(b) => JsonValue::Bool(*b),
                Value::I64(i) => JsonValue::from(*i),
                Value::F64(f) => serde_json::Number::from_f64(*f)
                    .map_or_else(|| JsonValue::String(f.to_string()), JsonValue::Number),
                Value::String(s) => JsonValue::String(s.to_string()),
                Value::Array(_) => JsonValue::String(kv.value.to_string()),
            };
            (kv.key.to_string(), value)
        })
        .collect()
}

/// Builds a tracer provider that exports every finished span to `file`.
pub fn create_tracer_provider(file: RotatingFile, resource: Resource) -> TracerProvider {
    let service = resource
        .get(opentelemetry::Key::from_static_str("service.name"))
        .map_or_else(|| env!("CARGO_PKG_NAME").to_string(), |v| v.to_string());

    let exporter = JsonLinesExporter {
        file,
        service,
        is_shutdown: AtomicBool::new(false),
    };

    TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_their_json_types() {
        let attrs = vec![
            KeyValue::new("post_id", "p1"),
            KeyValue::new("request_id", 7_i64),
            KeyValue::new("render", true),
        ];
        let json = attributes_to_json(&attrs);
        assert_eq!(json["post_id"], "p1");
        assert_eq!(json["request_id"], 7);
        assert_eq!(json["render"], true);
    }
}
