//! Product Cache Refresh Background Task
//!
//! Periodically pulls the full product set from the store and installs it in
//! the cache. The first cycle runs immediately at startup; afterwards one
//! cycle runs per period. Missed ticks are skipped rather than bunched up,
//! so a slow fetch never causes a burst of back-to-back refreshes.
//!
//! A failed cycle (fetch error, fetch timeout, cache install error) leaves
//! the cache as it was and the loop keeps going. Shutdown interrupts the
//! loop between cycles and also cancels an in-flight fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::constants::{DEFAULT_PRODUCTS_CACHE_TTL_SECS, DEFAULT_REFRESH_FETCH_TIMEOUT_SECS};
use crate::service::ProductService;
use crate::telemetry::metrics::metrics as global_metrics;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the cache refresh task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRefreshConfig {
    /// Time between refresh cycles (default: 60 seconds)
    pub period: Duration,

    /// Bound on a single snapshot fetch (default: 30 seconds)
    pub fetch_timeout: Duration,
}

impl Default for CacheRefreshConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(DEFAULT_PRODUCTS_CACHE_TTL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_REFRESH_FETCH_TIMEOUT_SECS),
        }
    }
}

impl CacheRefreshConfig {
    /// Short intervals for development and tests.
    pub fn development() -> Self {
        Self {
            period: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(2),
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for refresh activity over the task's lifetime.
#[derive(Debug, Default)]
pub struct CacheRefreshMetrics {
    /// Cycles attempted since startup
    pub refresh_cycles: AtomicU64,

    /// Cycles that left the cache unchanged because of an error
    pub refresh_failures: AtomicU64,

    /// Products installed by the last successful cycle
    pub entries_loaded: AtomicU64,

    /// Unix milliseconds of the last successful cycle, 0 if none
    pub last_success_unix_ms: AtomicU64,
}

impl CacheRefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> CacheRefreshSnapshot {
        let last = self.last_success_unix_ms.load(Ordering::Relaxed);
        CacheRefreshSnapshot {
            refresh_cycles: self.refresh_cycles.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            entries_loaded: self.entries_loaded.load(Ordering::Relaxed),
            last_success_unix_ms: (last > 0).then_some(last),
        }
    }
}

/// Snapshot of refresh metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRefreshSnapshot {
    pub refresh_cycles: u64,
    pub refresh_failures: u64,
    pub entries_loaded: u64,
    pub last_success_unix_ms: Option<u64>,
}

// ============================================================================
// HANDLE
// ============================================================================

/// Running refresh task.
///
/// Dropping the handle without calling [`RefreshHandle::stop`] also ends the
/// task, at its next await point, but nothing waits for it.
pub struct RefreshHandle {
    shutdown_tx: watch::Sender<bool>,
    warm_rx: watch::Receiver<bool>,
    metrics: Arc<CacheRefreshMetrics>,
    task: JoinHandle<Arc<CacheRefreshMetrics>>,
}

impl RefreshHandle {
    pub fn metrics(&self) -> Arc<CacheRefreshMetrics> {
        Arc::clone(&self.metrics)
    }

    /// True once any cycle has installed a snapshot.
    pub fn is_warm(&self) -> bool {
        *self.warm_rx.borrow()
    }

    /// Wait until the cache holds a snapshot, at most `timeout`.
    ///
    /// Returns false on timeout or if the task ended before warming up.
    pub async fn wait_until_warm(&self, timeout: Duration) -> bool {
        let mut warm_rx = self.warm_rx.clone();
        let warmed = matches!(
            tokio::time::timeout(timeout, warm_rx.wait_for(|warm| *warm)).await,
            Ok(Ok(_))
        );
        warmed
    }

    /// Signal shutdown and wait for the task to finish.
    pub async fn stop(self) -> CacheRefreshSnapshot {
        let _ = self.shutdown_tx.send(true);
        match self.task.await {
            Ok(metrics) => metrics.snapshot(),
            Err(e) => {
                tracing::warn!(error = %e, "Cache refresh task ended abnormally");
                self.metrics.snapshot()
            }
        }
    }
}

/// Spawn [`cache_refresh_task`] for `service` and return its handle.
pub fn spawn_cache_refresh(service: ProductService, config: CacheRefreshConfig) -> RefreshHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (warm_tx, warm_rx) = watch::channel(service.is_warm());
    let metrics = Arc::new(CacheRefreshMetrics::new());

    let task = tokio::spawn(cache_refresh_task(
        service,
        config,
        Arc::clone(&metrics),
        warm_tx,
        shutdown_rx,
    ));

    RefreshHandle {
        shutdown_tx,
        warm_rx,
        metrics,
        task,
    }
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Background task that keeps the product cache in sync with the store.
///
/// Runs until the shutdown signal is received or its sender is dropped.
/// `warm_tx` flips to true after the first successful cycle.
///
/// # Returns
///
/// Metrics collected during the task's lifetime
pub async fn cache_refresh_task(
    service: ProductService,
    config: CacheRefreshConfig,
    metrics: Arc<CacheRefreshMetrics>,
    warm_tx: watch::Sender<bool>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<CacheRefreshMetrics> {
    let mut refresh_interval = interval(config.period);
    refresh_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        period_secs = config.period.as_secs(),
        fetch_timeout_secs = config.fetch_timeout.as_secs(),
        "Cache refresh task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Cache refresh task shutting down");
                    break;
                }
            }
            _ = refresh_interval.tick() => {
                tokio::select! {
                    // Biased so a pending shutdown wins over starting a new fetch.
                    biased;
                    _ = shutdown_rx.wait_for(|stop| *stop) => {
                        tracing::info!("Cache refresh interrupted by shutdown");
                        break;
                    }
                    _ = refresh_cycle(&service, &config, &metrics, &warm_tx) => {}
                }
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        refresh_cycles = snapshot.refresh_cycles,
        refresh_failures = snapshot.refresh_failures,
        entries_loaded = snapshot.entries_loaded,
        "Cache refresh task completed"
    );

    metrics
}

/// Perform one refresh cycle.
async fn refresh_cycle(
    service: &ProductService,
    config: &CacheRefreshConfig,
    metrics: &CacheRefreshMetrics,
    warm_tx: &watch::Sender<bool>,
) {
    metrics.refresh_cycles.fetch_add(1, Ordering::Relaxed);

    match service.refresh_once(config.fetch_timeout).await {
        Ok(outcome) => {
            metrics
                .entries_loaded
                .store(outcome.entries as u64, Ordering::Relaxed);
            metrics
                .last_success_unix_ms
                .store(Utc::now().timestamp_millis().max(1) as u64, Ordering::Relaxed);
            warm_tx.send_replace(true);
        }
        Err(_) => {
            // Already logged and reported by the service.
            metrics.refresh_failures.fetch_add(1, Ordering::Relaxed);
            if let Some(global) = global_metrics() {
                global.record_refresh_failure();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::Product;
    use catalog_storage::MemoryEntityCache;
    use catalog_test_utils::{seeded_store, FlakyStore};

    fn service_over(store: Arc<FlakyStore>) -> ProductService {
        ProductService::new(store, Arc::new(MemoryEntityCache::<Product>::new()))
    }

    fn config(period_secs: u64, fetch_timeout_secs: u64) -> CacheRefreshConfig {
        CacheRefreshConfig {
            period: Duration::from_secs(period_secs),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = CacheRefreshConfig::default();
        assert_eq!(config.period, Duration::from_secs(60));
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert!(CacheRefreshConfig::development().period < config.period);
    }

    #[test]
    fn test_snapshot_reports_missing_success() {
        let metrics = CacheRefreshMetrics::new();
        assert_eq!(metrics.snapshot().last_success_unix_ms, None);
        metrics.last_success_unix_ms.store(42, Ordering::Relaxed);
        assert_eq!(metrics.snapshot().last_success_unix_ms, Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_is_immediate_then_periodic() {
        let (store, products) = seeded_store(3);
        let store = Arc::new(FlakyStore::new(store));
        let service = service_over(store.clone());

        let handle = service.start_refresh(config(60, 5));
        assert!(handle.wait_until_warm(Duration::from_secs(1)).await);
        assert_eq!(store.list_calls(), 1);
        assert_eq!(service.list(10, 0), products);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.list_calls(), 2);

        let snapshot = handle.stop().await;
        assert_eq!(snapshot.refresh_cycles, 2);
        assert_eq!(snapshot.refresh_failures, 0);
        assert_eq!(snapshot.entries_loaded, 3);
        assert!(snapshot.last_success_unix_ms.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_keeps_running() {
        let (store, products) = seeded_store(2);
        let store = Arc::new(FlakyStore::new(store));
        store.set_fail_list(true);
        let service = service_over(store.clone());

        let handle = service.start_refresh(config(10, 5));
        assert!(!handle.wait_until_warm(Duration::from_secs(5)).await);
        assert!(service.list(10, 0).is_empty());
        assert_eq!(handle.metrics().snapshot().refresh_failures, 1);

        store.set_fail_list(false);
        assert!(handle.wait_until_warm(Duration::from_secs(10)).await);
        assert_eq!(service.list(10, 0), products);

        let snapshot = handle.stop().await;
        assert_eq!(snapshot.refresh_failures, 1);
        assert_eq!(snapshot.refresh_cycles, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_times_out() {
        let (store, _) = seeded_store(2);
        let store = Arc::new(FlakyStore::new(store));
        let gate = store.gate_next_list();
        let service = service_over(store.clone());

        let handle = service.start_refresh(config(60, 1));
        let _ = gate.snapshot_taken.await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let snapshot = handle.metrics().snapshot();
        assert_eq!(snapshot.refresh_failures, 1);
        assert!(!handle.is_warm());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_fetch() {
        let (store, _) = seeded_store(2);
        let store = Arc::new(FlakyStore::new(store));
        let gate = store.gate_next_list();
        let service = service_over(store.clone());

        let handle = service.start_refresh(config(60, 30));
        let _ = gate.snapshot_taken.await;

        // The gated fetch is still waiting for release; stop must not wait for it.
        let snapshot = handle.stop().await;
        assert_eq!(snapshot.refresh_cycles, 1);
        assert_eq!(snapshot.entries_loaded, 0);
        assert!(!service.is_warm());
        drop(gate.release);
    }

    #[tokio::test]
    async fn test_seeded_service_starts_warm() -> catalog_core::CatalogResult<()> {
        let (store, products) = seeded_store(1);
        let store = Arc::new(FlakyStore::new(store));
        let service = service_over(store.clone());
        service.seed(products)?;

        let handle = service.start_refresh(config(60, 5));
        assert!(handle.is_warm());
        handle.stop().await;
        Ok(())
    }
}
