//! Tracing/logging (shared setup).

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide tracing, choosing the format from `LOG_FORMAT`.
///
/// An unrecognised value falls back to JSON and is reported once the
/// subscriber is up. This is safe to call multiple times; subsequent calls
/// become no-ops.
pub fn init() {
    let (format, rejected) = format_from(std::env::var("LOG_FORMAT").ok().as_deref());
    tracing::init_with(format);

    if let Some(err) = rejected {
        ::tracing::warn!(error = %err, fallback = ?format, "ignoring LOG_FORMAT");
    }
}

/// Format for a raw `LOG_FORMAT` value, plus the parse error when it was rejected.
fn format_from(raw: Option<&str>) -> (LogFormat, Option<String>) {
    match raw.map(str::parse::<LogFormat>) {
        None => (LogFormat::default(), None),
        Some(Ok(format)) => (format, None),
        Some(Err(err)) => (LogFormat::default(), Some(err)),
    }
}
