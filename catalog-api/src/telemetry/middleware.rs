//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Provides automatic instrumentation of all HTTP requests with:
//! - Distributed tracing spans
//! - Prometheus metrics collection
//! - Trace context propagation (traceparent header)

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use opentelemetry::{
    context::FutureExt as _,
    global,
    trace::{SpanKind, Status, TraceContextExt, Tracer},
    Context, KeyValue,
};
use opentelemetry_http::HeaderExtractor;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::metrics;
use crate::constants::REQUEST_ID_HEADER;

static UUID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .ok()
});

static NUMERIC_ID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/\d+(/|$)").ok());

/// Extract trace context from incoming request headers.
fn extract_trace_context(headers: &HeaderMap) -> Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(headers)))
}

/// Normalize path for metrics/spans (replace UUIDs and IDs with placeholders).
///
/// This prevents high-cardinality label explosion in Prometheus.
fn normalize_path(path: &str) -> String {
    let mut result = path.to_string();
    if let Some(pattern) = UUID_PATTERN.as_ref() {
        result = pattern.replace_all(&result, "{id}").into_owned();
    }
    if let Some(pattern) = NUMERIC_ID_PATTERN.as_ref() {
        result = pattern.replace_all(&result, "/{id}$1").into_owned();
    }
    result
}

/// Observability middleware for Axum.
///
/// This middleware wraps every request with an OpenTelemetry span (with
/// trace context propagation), records Prometheus metrics and logs the
/// completed request. The request id set by the request-id layer is carried
/// on the span.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let parent_context = extract_trace_context(request.headers());

    let tracer = global::tracer("catalog-api");
    let span = tracer
        .span_builder(format!("{} {}", method, normalized_path))
        .with_kind(SpanKind::Server)
        .with_attributes(vec![
            KeyValue::new("http.method", method.to_string()),
            KeyValue::new("http.target", path.clone()),
            KeyValue::new("http.route", normalized_path.clone()),
            KeyValue::new("request.id", request_id.clone()),
        ])
        .start_with_context(&tracer, &parent_context);
    let cx = parent_context.with_span(span);

    let tracing_span = info_span!(
        "http_request",
        http.method = %method,
        http.route = %normalized_path,
        request_id = %request_id,
        otel.kind = "server",
    );

    let response = next
        .run(request)
        .instrument(tracing_span)
        .with_context(cx.clone())
        .await;

    let duration = start.elapsed();
    let status = response.status();

    if let Some(metrics) = metrics() {
        metrics.record_http_request(
            method.as_str(),
            &normalized_path,
            status.as_u16(),
            duration.as_secs_f64(),
        );
    }

    let otel_span = cx.span();
    otel_span.set_attribute(KeyValue::new("http.status_code", status.as_u16() as i64));
    if status.is_server_error() {
        otel_span.set_status(Status::error("Server error"));
    } else if status.is_client_error() {
        otel_span.set_status(Status::error("Client error"));
    } else {
        otel_span.set_status(Status::Ok);
    }
    otel_span.end();

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        request_id = %request_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/products/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/products/{id}");
    }

    #[test]
    fn test_normalize_path_numeric_id() {
        assert_eq!(normalize_path("/api/v1/items/12345"), "/api/v1/items/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/products"), "/api/v1/products");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }

    #[test]
    fn test_normalize_path_malformed_id_kept() {
        assert_eq!(
            normalize_path("/api/v1/products/not-a-uuid"),
            "/api/v1/products/not-a-uuid"
        );
    }
}
