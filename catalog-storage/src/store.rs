//! Authoritative store contract.
//!
//! The store is the system of record. The orchestrator consults it on every
//! write and the refresh job pulls the full data set from it on every tick.
//! Cancellation is by dropping the returned future; implementations must not
//! leave partial writes behind when that happens.

use ::async_trait::async_trait;
use catalog_core::{CatalogResult, Product, ProductId};

/// Async product store.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, sorted by id ascending.
    async fn product_list_all(&self) -> CatalogResult<Vec<Product>>;

    /// Replace the stored document for `id` and return what was stored.
    /// `StorageError::NotFound` when no product has that id.
    async fn product_update(&self, id: ProductId, product: &Product) -> CatalogResult<Product>;

    /// `StorageError::NotFound` when no product has that id.
    async fn product_delete(&self, id: ProductId) -> CatalogResult<()>;

    /// Bulk insert. Used by the seeding tool only.
    async fn product_insert_many(&self, products: &[Product]) -> CatalogResult<()>;

    /// Cheap reachability probe for readiness checks.
    async fn health_check(&self) -> CatalogResult<()> {
        Ok(())
    }
}
