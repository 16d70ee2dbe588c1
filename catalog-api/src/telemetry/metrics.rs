//! Prometheus Metrics Definitions
//!
//! Defines all catalog metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec,
    CounterVec, Encoder, Gauge, Histogram, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Database operation latency buckets (seconds)
const DB_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Full refresh latency buckets (seconds). A refresh pulls the whole table.
const REFRESH_LATENCY_BUCKETS: &[f64] =
    &[0.010, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<CatalogMetrics>> = Lazy::new(CatalogMetrics::new);

/// The global metrics, if registration succeeded.
pub fn metrics() -> Option<&'static CatalogMetrics> {
    METRICS.as_ref().ok()
}

fn registration_failed(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

/// Container for all catalog metrics.
#[derive(Clone)]
pub struct CatalogMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// gRPC call counter - labels: method, code
    pub grpc_requests_total: CounterVec,

    /// gRPC call duration histogram - labels: method
    pub grpc_request_duration_seconds: HistogramVec,

    /// Database operation counter - labels: operation, entity, status
    pub db_operations_total: CounterVec,

    /// Database operation duration histogram - labels: operation, entity
    pub db_operation_duration_seconds: HistogramVec,

    /// Entries currently held by the product cache
    pub cache_entries: Gauge,

    /// Refresh cycles - labels: status (success/failure)
    pub cache_refresh_total: CounterVec,

    /// Duration of successful refresh cycles
    pub cache_refresh_duration_seconds: Histogram,

    /// Unix time of the last successful refresh
    pub cache_last_refresh_timestamp_seconds: Gauge,

    /// Errors sent to error tracking - labels: component, operation
    pub errors_reported_total: CounterVec,
}

impl CatalogMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "catalog_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_failed("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "catalog_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("http_request_duration_seconds", e))?,

            grpc_requests_total: register_counter_vec!(
                "catalog_grpc_requests_total",
                "Total number of gRPC calls",
                &["method", "code"]
            )
            .map_err(|e| registration_failed("grpc_requests_total", e))?,

            grpc_request_duration_seconds: register_histogram_vec!(
                "catalog_grpc_request_duration_seconds",
                "gRPC call duration in seconds",
                &["method"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("grpc_request_duration_seconds", e))?,

            db_operations_total: register_counter_vec!(
                "catalog_db_operations_total",
                "Total number of database operations",
                &["operation", "entity", "status"]
            )
            .map_err(|e| registration_failed("db_operations_total", e))?,

            db_operation_duration_seconds: register_histogram_vec!(
                "catalog_db_operation_duration_seconds",
                "Database operation duration in seconds",
                &["operation", "entity"],
                DB_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("db_operation_duration_seconds", e))?,

            cache_entries: register_gauge!(
                "catalog_cache_entries",
                "Entries currently held by the product cache"
            )
            .map_err(|e| registration_failed("cache_entries", e))?,

            cache_refresh_total: register_counter_vec!(
                "catalog_cache_refresh_total",
                "Product cache refresh cycles",
                &["status"]
            )
            .map_err(|e| registration_failed("cache_refresh_total", e))?,

            cache_refresh_duration_seconds: register_histogram!(
                "catalog_cache_refresh_duration_seconds",
                "Duration of successful product cache refreshes in seconds",
                REFRESH_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("cache_refresh_duration_seconds", e))?,

            cache_last_refresh_timestamp_seconds: register_gauge!(
                "catalog_cache_last_refresh_timestamp_seconds",
                "Unix time of the last successful product cache refresh"
            )
            .map_err(|e| registration_failed("cache_last_refresh_timestamp_seconds", e))?,

            errors_reported_total: register_counter_vec!(
                "catalog_errors_reported_total",
                "Errors sent to error tracking",
                &["component", "operation"]
            )
            .map_err(|e| registration_failed("errors_reported_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a gRPC call.
    pub fn record_grpc_request(&self, method: &str, code: tonic::Code, duration_secs: f64) {
        let code_str = format!("{:?}", code);
        self.grpc_requests_total
            .with_label_values(&[method, code_str.as_str()])
            .inc();
        self.grpc_request_duration_seconds
            .with_label_values(&[method])
            .observe(duration_secs);
    }

    /// Record a database operation.
    pub fn record_db_operation(
        &self,
        operation: &str,
        entity: &str,
        success: bool,
        duration_secs: f64,
    ) {
        let status = if success { "success" } else { "error" };
        self.db_operations_total
            .with_label_values(&[operation, entity, status])
            .inc();
        self.db_operation_duration_seconds
            .with_label_values(&[operation, entity])
            .observe(duration_secs);
    }

    pub fn set_cache_entries(&self, entries: usize) {
        self.cache_entries.set(entries as f64);
    }

    /// Record a successful refresh that installed `entries` products.
    pub fn record_refresh_success(&self, entries: usize, duration_secs: f64, finished_unix_secs: f64) {
        self.cache_refresh_total.with_label_values(&["success"]).inc();
        self.cache_refresh_duration_seconds.observe(duration_secs);
        self.cache_last_refresh_timestamp_seconds.set(finished_unix_secs);
        self.set_cache_entries(entries);
    }

    pub fn record_refresh_failure(&self) {
        self.cache_refresh_total.with_label_values(&["failure"]).inc();
    }

    pub fn record_reported_error(&self, component: &str, operation: &str) {
        self.errors_reported_total
            .with_label_values(&[component, operation])
            .inc();
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Touch the registry so the catalog families exist even before traffic.
    let _ = metrics();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
