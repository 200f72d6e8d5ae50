//! Logging initialization.
//!
//! Thin wrapper over the `observability` crate so binaries only deal with a
//! level string and an optional log file.

use std::path::PathBuf;

pub use observability::LogConfig;

/// Initialize logging with a custom service name and optional JSONL file.
///
/// An unrecognised level falls back to `info`.
pub fn init_logging_for_service(service_name: &str, level: &str, log_path: Option<PathBuf>) {
    let level = parse_level(level).unwrap_or(tracing::Level::INFO);
    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: level_directive(level).into(),
        log_path,
        also_stderr: true,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

fn level_directive(level: tracing::Level) -> &'static str {
    match level {
        tracing::Level::TRACE => "trace",
        tracing::Level::DEBUG => "debug",
        tracing::Level::INFO => "info",
        tracing::Level::WARN => "warn",
        tracing::Level::ERROR => "error",
    }
}
