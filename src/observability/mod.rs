//! Tracing with file-based span export.
//!
//! ```text
//! tracing spans → tracing-opentelemetry → SDK provider → JsonLinesExporter → RotatingFile
//! ```
//!
//! Spans land in `~/.local/share/zellij/roadguard-moderator/roadguard-traces.jsonl`,
//! one JSON object per line, rotated at 5 MB with three numbered backups.
//! The level comes from the `trace_level` plugin option.
//!
//! # Modules
//!
//! - [`init`]: Subscriber installation
//! - [`exporter`]: JSON-lines `SpanExporter` and tracer provider
//! - [`rotating`]: Size-rotated line file

mod exporter;
mod init;
pub mod rotating;

pub use init::{init_tracing, TRACE_FILE};
pub use rotating::RotatingFile;
