//! Catalog Storage - Entity Cache and Store Contract
//!
//! Defines the read cache that serves every catalog read, and the contract
//! of the authoritative store behind it. The PostgreSQL store lives in
//! catalog-api; this crate ships an in-memory store for tests and local runs.

pub mod cache;
pub mod store;

pub use cache::{
    CacheResult, CacheStats, CacheableEntity, EntityCache, MemoryEntityCache, Watermark,
    WriteJournal, WriteKind,
};
pub use store::ProductStore;

use ::async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult, EntityType, Product, ProductId, StorageError};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

fn lock_poisoned<T>(_: PoisonError<T>) -> CatalogError {
    CatalogError::Storage(StorageError::Unavailable {
        reason: "store lock poisoned".to_string(),
    })
}

fn not_found(id: ProductId) -> CatalogError {
    CatalogError::Storage(StorageError::NotFound {
        entity_type: EntityType::Product,
        id: id.to_string(),
    })
}

/// In-memory product store.
///
/// Ordered by id, so `product_list_all` matches the ordering contract of
/// real stores. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<BTreeMap<ProductId, Product>>>,
}

impl InMemoryProductStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `products`. Later duplicates win.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: Arc::new(RwLock::new(map)),
        }
    }

    /// Direct lookup, bypassing any cache.
    pub fn get(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        let products = self.products.read().map_err(lock_poisoned)?;
        Ok(products.get(&id).cloned())
    }

    pub fn len(&self) -> usize {
        self.products.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every product.
    pub fn clear(&self) -> CatalogResult<()> {
        self.products.write().map_err(lock_poisoned)?.clear();
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn product_list_all(&self) -> CatalogResult<Vec<Product>> {
        let products = self.products.read().map_err(lock_poisoned)?;
        Ok(products.values().cloned().collect())
    }

    async fn product_update(&self, id: ProductId, product: &Product) -> CatalogResult<Product> {
        let mut products = self.products.write().map_err(lock_poisoned)?;
        let stored = products.get_mut(&id).ok_or_else(|| not_found(id))?;
        *stored = Product {
            id,
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn product_delete(&self, id: ProductId) -> CatalogResult<()> {
        let mut products = self.products.write().map_err(lock_poisoned)?;
        products.remove(&id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn product_insert_many(&self, batch: &[Product]) -> CatalogResult<()> {
        let mut products = self.products.write().map_err(lock_poisoned)?;
        if let Some(dup) = batch.iter().find(|p| products.contains_key(&p.id)) {
            return Err(CatalogError::Storage(StorageError::QueryFailed {
                reason: format!("duplicate product id {}", dup.id),
            }));
        }
        for product in batch {
            products.insert(product.id, product.clone());
        }
        Ok(())
    }
}
