//! Catalog Test Utilities
//!
//! Shared test infrastructure for the catalog workspace:
//! - Proptest generators for products and identifiers
//! - Fixtures for common scenarios
//! - Fault-injecting store and cache doubles

// Re-export the in-memory store from its source crate
pub use catalog_storage::{InMemoryProductStore, MemoryEntityCache};

// Re-export core types for convenience
pub use catalog_core::{
    new_product_id, CacheError, CatalogError, CatalogResult, EntityType, Product, ProductId,
    StorageError, ValidationError,
};

use async_trait::async_trait;
use catalog_storage::{
    CacheResult, CacheStats, CacheableEntity, EntityCache, ProductStore, Watermark,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::oneshot;

// ============================================================================
// FAULT-INJECTING STORE
// ============================================================================

/// Handle returned by [`FlakyStore::gate_next_list`].
///
/// `snapshot_taken` fires once the gated `product_list_all` has read its
/// snapshot; the call then waits until `release` is sent or dropped.
pub struct ListGate {
    pub snapshot_taken: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct ArmedGate {
    snapshot_taken: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Product store wrapper that can fail or stall on demand.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryProductStore,
    fail_list: AtomicBool,
    fail_writes: AtomicBool,
    list_calls: AtomicU64,
    gate: Mutex<Option<ArmedGate>>,
}

impl FlakyStore {
    pub fn new(inner: InMemoryProductStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    /// The wrapped store, for direct inspection.
    pub fn inner(&self) -> &InMemoryProductStore {
        &self.inner
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Stall the next `product_list_all` after it has read its snapshot.
    pub fn gate_next_list(&self) -> ListGate {
        let (taken_tx, taken_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.lock() = Some(ArmedGate {
            snapshot_taken: taken_tx,
            release: release_rx,
        });
        ListGate {
            snapshot_taken: taken_rx,
            release: release_tx,
        }
    }

    fn unavailable() -> CatalogError {
        CatalogError::Storage(StorageError::Unavailable {
            reason: "injected failure".to_string(),
        })
    }
}

#[async_trait]
impl ProductStore for FlakyStore {
    async fn product_list_all(&self) -> CatalogResult<Vec<Product>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let snapshot = self.inner.product_list_all().await?;

        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.snapshot_taken.send(());
            let _ = gate.release.await;
        }
        Ok(snapshot)
    }

    async fn product_update(&self, id: ProductId, product: &Product) -> CatalogResult<Product> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.product_update(id, product).await
    }

    async fn product_delete(&self, id: ProductId) -> CatalogResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.product_delete(id).await
    }

    async fn product_insert_many(&self, products: &[Product]) -> CatalogResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.product_insert_many(products).await
    }
}

// ============================================================================
// FAULT-INJECTING CACHE
// ============================================================================

/// Entity cache wrapper whose mutations can be made to fail.
pub struct FlakyCache<V> {
    inner: MemoryEntityCache<V>,
    fail_writes: AtomicBool,
    fail_replace: AtomicBool,
}

impl<V: CacheableEntity> Default for FlakyCache<V> {
    fn default() -> Self {
        Self {
            inner: MemoryEntityCache::new(),
            fail_writes: AtomicBool::new(false),
            fail_replace: AtomicBool::new(false),
        }
    }
}

impl<V: CacheableEntity> FlakyCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryEntityCache<V> {
        &self.inner
    }

    /// Make `set` and `delete` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `replace` and `replace_since` fail.
    pub fn set_fail_replace(&self, fail: bool) {
        self.fail_replace.store(fail, Ordering::SeqCst);
    }

    fn unavailable() -> CacheError {
        CacheError::Unavailable {
            reason: "injected failure".to_string(),
        }
    }
}

impl<V: CacheableEntity> EntityCache<V> for FlakyCache<V> {
    fn get(&self, key: &str) -> CacheResult<V> {
        self.inner.get(key)
    }

    fn set(&self, value: V) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.set(value)
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.delete(key)
    }

    fn get_list(&self, limit: usize, offset: usize) -> Vec<V> {
        self.inner.get_list(limit, offset)
    }

    fn replace(&self, values: Vec<V>) -> CacheResult<()> {
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.replace(values)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    fn watermark(&self) -> Watermark {
        self.inner.watermark()
    }

    fn replace_since(&self, values: Vec<V>, since: Watermark) -> CacheResult<()> {
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.replace_since(values, since)
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for catalog types.

    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    /// Generate a random ProductId.
    pub fn arb_product_id() -> impl Strategy<Value = ProductId> {
        any::<[u8; 16]>().prop_map(|bytes| ProductId::new(Uuid::from_bytes(bytes)))
    }

    /// Generate a product that passes validation.
    pub fn arb_product() -> impl Strategy<Value = Product> {
        (
            arb_product_id(),
            "[A-Za-z][A-Za-z0-9 ]{0,31}",
            "[A-Za-z][A-Za-z0-9 .,]{0,63}",
            1..=i32::MAX,
        )
            .prop_map(|(id, name, description, price)| Product {
                id,
                name,
                description,
                price,
            })
    }

    /// Generate a product that fails validation in exactly one field.
    pub fn arb_invalid_product() -> impl Strategy<Value = Product> {
        (arb_product(), 0u8..3, i32::MIN..=0).prop_map(|(mut product, broken, price)| {
            match broken {
                0 => product.name.clear(),
                1 => product.description.clear(),
                _ => product.price = price,
            }
            product
        })
    }

    /// Generate a list of products with distinct ids, sorted by id.
    pub fn arb_product_list(max: usize) -> impl Strategy<Value = Vec<Product>> {
        prop::collection::vec(arb_product(), 0..max).prop_map(|mut products| {
            products.sort_by_key(|p| p.id);
            products.dedup_by_key(|p| p.id);
            products
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common scenarios.

    use super::*;

    /// Create a valid product with a fresh id.
    pub fn make_product(name: &str) -> Product {
        Product::new(
            new_product_id(),
            name,
            format!("{name} description"),
            100,
        )
    }

    /// Create `count` valid products, sorted by id (store order).
    pub fn make_products(count: usize) -> Vec<Product> {
        let mut products: Vec<Product> = (0..count)
            .map(|i| make_product(&format!("product-{i}")))
            .collect();
        products.sort_by_key(|p| p.id);
        products
    }

    /// Create an in-memory store seeded with `count` products.
    pub fn seeded_store(count: usize) -> (InMemoryProductStore, Vec<Product>) {
        let products = make_products(count);
        (InMemoryProductStore::with_products(products.clone()), products)
    }
}

pub use fixtures::*;
pub use generators::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flaky_store_fails_on_demand() {
        let (store, _) = seeded_store(2);
        let flaky = FlakyStore::new(store);

        assert!(flaky.product_list_all().await.is_ok());
        flaky.set_fail_list(true);
        assert!(flaky.product_list_all().await.is_err());
        assert_eq!(flaky.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_flaky_store_gate_releases() -> CatalogResult<()> {
        let (store, products) = seeded_store(3);
        let flaky = std::sync::Arc::new(FlakyStore::new(store));
        let gate = flaky.gate_next_list();

        let task = {
            let flaky = flaky.clone();
            tokio::spawn(async move { flaky.product_list_all().await })
        };
        let _ = gate.snapshot_taken.await;
        let _ = gate.release.send(());

        let listed = task.await.map_err(|e| {
            CatalogError::Storage(StorageError::Unavailable {
                reason: e.to_string(),
            })
        })??;
        assert_eq!(listed, products);
        Ok(())
    }

    #[test]
    fn test_flaky_cache_fails_writes() {
        let cache: FlakyCache<Product> = FlakyCache::new();
        cache.set_fail_writes(true);
        assert!(cache.set(make_product("a")).is_err());
        cache.set_fail_writes(false);
        assert!(cache.set(make_product("a")).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_make_products_sorted() {
        let products = make_products(10);
        assert!(products.windows(2).all(|w| w[0].id < w[1].id));
    }
}
