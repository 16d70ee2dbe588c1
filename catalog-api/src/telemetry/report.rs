//! Error tracking.
//!
//! Unexpected failures are reported here in addition to being logged at the
//! call site. A report becomes an ERROR event on the current span, which the
//! OpenTelemetry layer exports as an exception and an errored span status,
//! and bumps `catalog_errors_reported_total`.

use super::metrics::metrics;

/// Report an unexpected error for `component`/`operation`.
pub fn report_error<E>(component: &'static str, operation: &'static str, err: &E)
where
    E: std::error::Error + ?Sized,
{
    tracing::error!(
        target: "catalog_api::errors",
        component,
        operation,
        exception.message = %err,
        "error reported"
    );
    if let Some(metrics) = metrics() {
        metrics.record_reported_error(component, operation);
    }
}
