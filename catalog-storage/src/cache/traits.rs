//! Cache traits and the cacheable entity contract.

use catalog_core::{CacheError, Product, Timestamp};
use serde::Serialize;

use super::watermark::Watermark;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Contract for values held by an [`EntityCache`].
///
/// # Implementation Requirements
///
/// - `cache_key()` must be derived from the entity's identity only, so the
///   same entity always yields the same key across updates
/// - two distinct entities must never share a key
pub trait CacheableEntity: Clone + Send + Sync + 'static {
    fn cache_key(&self) -> String;
}

impl CacheableEntity for Product {
    fn cache_key(&self) -> String {
        self.id.to_string()
    }
}

/// Point-in-time view of cache state, for health and metrics reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of entries currently held.
    pub entries: usize,
    /// Whether at least one full replacement has happened.
    pub warm: bool,
    /// When the last full replacement was installed.
    pub last_replaced_at: Option<Timestamp>,
    /// Full replacements since creation.
    pub replacements: u64,
    /// Local writes still tracked for reconciliation with the next snapshot.
    pub tracked_writes: usize,
}

/// Concurrency-safe keyed cache with ordered listing.
///
/// All operations are synchronous and never perform I/O. Implementations
/// must give readers a fully applied view of every mutation: no reader
/// observes a half-applied `set`, `delete` or `replace`.
pub trait EntityCache<V: CacheableEntity>: Send + Sync {
    /// Look up one entity. `KeyNotFound` if absent.
    fn get(&self, key: &str) -> CacheResult<V>;

    /// Upsert by the entity's own key. Existing keys are overwritten in
    /// place; new keys are appended.
    fn set(&self, value: V) -> CacheResult<()>;

    /// Remove one entity, keeping the relative order of the rest.
    /// `KeyNotFound` if absent.
    fn delete(&self, key: &str) -> CacheResult<()>;

    /// Up to `limit` entities starting at `offset`, in sequence order.
    /// Out-of-range windows are clamped. The result is an owned copy.
    fn get_list(&self, limit: usize, offset: usize) -> Vec<V>;

    /// Atomically install `values` as the full cache content, in order.
    fn replace(&self, values: Vec<V>) -> CacheResult<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;

    /// Current local write watermark. Capture it before fetching a snapshot
    /// and hand it back to [`EntityCache::replace_since`].
    fn watermark(&self) -> Watermark {
        Watermark::zero()
    }

    /// Install a snapshot fetched after `since` was captured, keeping local
    /// writes newer than `since`. Backends without write tracking fall back
    /// to a plain replace.
    fn replace_since(&self, values: Vec<V>, since: Watermark) -> CacheResult<()> {
        let _ = since;
        self.replace(values)
    }
}
