use tracing::{Level, Span, field};

use super::TraceId;

/// Create a root span for a batch or job.
///
/// `records` and `accepted` start empty so callers can record them once
/// known.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::span!(
        Level::INFO,
        "root",
        name = %name,
        trace_id = %trace_id,
        records = field::Empty,
        accepted = field::Empty
    )
}

/// Create a child span (inherits trace_id from the enclosing root span)
pub fn child_span(name: &'static str) -> Span {
    tracing::span!(Level::INFO, "child", name = %name)
}
