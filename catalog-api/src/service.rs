//! Product Service
//!
//! Coordinates the authoritative store and the read cache. Reads are served
//! from the cache only. Writes go to the store first; once the store has
//! accepted a write the cache is updated on a best-effort basis, and a cache
//! failure at that point is logged and reported but never surfaced, since
//! the next refresh repairs the cache from the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog_core::{CatalogError, CatalogResult, Product, ProductId, StorageError};
use catalog_storage::{CacheStats, EntityCache, ProductStore};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::constants::DEFAULT_PAGE_SIZE;
use crate::jobs::{spawn_cache_refresh, CacheRefreshConfig, RefreshHandle};
use crate::telemetry::{metrics, report_error};

/// Result of one successful refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Products installed in the cache.
    pub entries: usize,
    /// Time from the start of the fetch to the end of the install.
    pub duration: Duration,
}

/// Effective list window for a requested `limit`.
///
/// 0 selects [`DEFAULT_PAGE_SIZE`]; any other value is used as given.
pub fn effective_limit(limit: usize) -> usize {
    match limit {
        0 => DEFAULT_PAGE_SIZE,
        n => n,
    }
}

/// Product orchestrator shared by the REST and gRPC surfaces.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    cache: Arc<dyn EntityCache<Product>>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, cache: Arc<dyn EntityCache<Product>>) -> Self {
        Self { store, cache }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// True once a full snapshot has been installed.
    pub fn is_warm(&self) -> bool {
        self.cache.stats().warm
    }

    /// Probe the store, for readiness checks.
    pub async fn check_store(&self) -> CatalogResult<()> {
        self.store.health_check().await
    }

    /// A window of the cached product sequence. Never touches the store.
    #[instrument(name = "ProductService.list", skip(self))]
    pub fn list(&self, limit: usize, offset: usize) -> Vec<Product> {
        self.cache.get_list(effective_limit(limit), offset)
    }

    /// Validate `candidate`, write it under `id`, then mirror it into the cache.
    ///
    /// The `id` argument wins over `candidate.id`.
    #[instrument(name = "ProductService.update", skip(self, candidate), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, candidate: Product) -> CatalogResult<Product> {
        let candidate = Product { id, ..candidate };
        candidate.validate()?;

        let stored = self.store.product_update(id, &candidate).await?;

        match self.cache.set(stored.clone()) {
            Ok(()) => self.publish_cache_size(),
            Err(err) => {
                warn!(error = %err, product_id = %id, "error while updating product in cache");
                report_error("cache", "set", &err);
            }
        }
        Ok(stored)
    }

    /// Delete `id` from the store, then from the cache.
    #[instrument(name = "ProductService.delete", skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> CatalogResult<()> {
        self.store.product_delete(id).await?;

        match self.cache.delete(&id.to_string()) {
            Ok(()) => self.publish_cache_size(),
            Err(err) => {
                warn!(error = %err, product_id = %id, "error while deleting product from cache");
                report_error("cache", "delete", &err);
            }
        }
        Ok(())
    }

    fn publish_cache_size(&self) {
        if let Some(metrics) = metrics() {
            metrics.set_cache_entries(self.cache.len());
        }
    }

    /// Install `products` as the full cache content without touching the store.
    pub fn seed(&self, products: Vec<Product>) -> CatalogResult<()> {
        self.cache.replace(products)?;
        self.publish_cache_size();
        Ok(())
    }

    /// Fetch the full snapshot from the store and install it.
    ///
    /// The write watermark is captured before the fetch, so writes that land
    /// while the fetch is in flight survive the install. On failure the
    /// cache keeps its previous content.
    #[instrument(name = "ProductService.refresh_once", skip(self))]
    pub async fn refresh_once(&self, fetch_timeout: Duration) -> CatalogResult<RefreshOutcome> {
        let start = Instant::now();
        info!("Start syncing cache");

        let since = self.cache.watermark();
        let fetched = tokio::time::timeout(fetch_timeout, self.store.product_list_all())
            .await
            .unwrap_or_else(|_| {
                Err(CatalogError::Storage(StorageError::Timeout {
                    operation: "product_list_all".to_string(),
                }))
            });
        let products = match fetched {
            Ok(products) => products,
            Err(err) => {
                warn!(error = %err, "can't sync cache");
                report_error("refresh", "fetch", &err);
                return Err(err);
            }
        };

        let entries = products.len();
        if let Err(err) = self.cache.replace_since(products, since) {
            warn!(error = %err, "can't set batch in cache");
            report_error("refresh", "install", &err);
            return Err(err.into());
        }

        let duration = start.elapsed();
        let cached = self.cache.len();
        if let Some(metrics) = metrics() {
            metrics.record_refresh_success(
                cached,
                duration.as_secs_f64(),
                Utc::now().timestamp_millis() as f64 / 1000.0,
            );
        }
        info!(
            entries,
            cached,
            duration_ms = duration.as_millis() as u64,
            "Cache synced with database"
        );

        Ok(RefreshOutcome { entries, duration })
    }

    /// Spawn the periodic refresh job for this service.
    pub fn start_refresh(&self, config: CacheRefreshConfig) -> RefreshHandle {
        spawn_cache_refresh(self.clone(), config)
    }
}
