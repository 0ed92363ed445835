//! Minimal W3C trace-context propagation by manual header manipulation.

use http::{HeaderMap, HeaderName, HeaderValue};

/// W3C Trace Context header name
pub const TRACEPARENT: &str = "traceparent";

/// Build a fresh `traceparent` value (version 00, sampled).
pub fn new_traceparent() -> String {
    let trace_id = format!("{:032x}", rand::random::<u128>());
    let span_id = format!("{:016x}", rand::random::<u64>());
    format!("00-{trace_id}-{span_id}-01")
}

/// Inject a `traceparent` header unless the caller already set one.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    if headers.contains_key(TRACEPARENT) {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&new_traceparent()) {
        headers.insert(HeaderName::from_static(TRACEPARENT), value);
    }
}

/// Trace ID segment of a `traceparent` value.
pub fn parse_trace_id(traceparent: &str) -> Option<&str> {
    let mut parts = traceparent.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("00"), Some(trace_id), Some(_), Some(_)) if trace_id.len() == 32 => Some(trace_id),
        _ => None,
    }
}
