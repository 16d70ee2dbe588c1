//! Catalog Telemetry - Observability Infrastructure
//!
//! Provides OpenTelemetry tracing, Prometheus metrics and error tracking for
//! the API layer. All features work standalone without external dependencies.

pub mod metrics;
pub mod middleware;
pub mod report;
pub mod tracer;

pub use metrics::{metrics, metrics_handler, CatalogMetrics, METRICS};
pub use middleware::observability_middleware;
pub use report::report_error;
pub use tracer::{init_tracer, TelemetryConfig, TelemetryGuard};
