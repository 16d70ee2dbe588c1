//! Sequence + index map entity cache.
//!
//! Entities live in one `Vec` that defines listing order, and a
//! `HashMap<String, usize>` maps each key to its position. Both containers,
//! together with the write journal, sit behind a single read-write lock, so
//! every mutation is applied as one unit with respect to readers.
//!
//! Invariant: the index is a bijection from keys onto `0..items.len()` and
//! `items[index[k]].cache_key() == k` for every key `k`.

use std::collections::HashMap;

use catalog_core::CacheError;
use chrono::Utc;
use parking_lot::RwLock;

use super::traits::{CacheResult, CacheStats, CacheableEntity, EntityCache};
use super::watermark::{Watermark, WriteJournal, WriteKind};
use catalog_core::Timestamp;

const INITIAL_CAPACITY: usize = 100;

struct Inner<V> {
    items: Vec<V>,
    index: HashMap<String, usize>,
    journal: WriteJournal,
    last_replaced_at: Option<Timestamp>,
    replacements: u64,
}

impl<V: CacheableEntity> Inner<V> {
    fn lookup(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&pos| &self.items[pos])
    }
}

/// Upsert into a sequence/index pair. Existing keys keep their position.
fn upsert<V: CacheableEntity>(items: &mut Vec<V>, index: &mut HashMap<String, usize>, value: V) {
    let key = value.cache_key();
    match index.get(&key) {
        Some(&pos) => items[pos] = value,
        None => {
            index.insert(key, items.len());
            items.push(value);
        }
    }
}

/// In-memory [`EntityCache`].
pub struct MemoryEntityCache<V> {
    inner: RwLock<Inner<V>>,
}

impl<V: CacheableEntity> Default for MemoryEntityCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: CacheableEntity> MemoryEntityCache<V> {
    /// Create an empty, cold cache.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: Vec::with_capacity(capacity),
                index: HashMap::with_capacity(capacity),
                journal: WriteJournal::new(),
                last_replaced_at: None,
                replacements: 0,
            }),
        }
    }

    /// Whether a full replacement has ever been installed.
    pub fn is_warm(&self) -> bool {
        self.inner.read().last_replaced_at.is_some()
    }

    pub fn last_replaced_at(&self) -> Option<Timestamp> {
        self.inner.read().last_replaced_at
    }

    /// Verify the index/sequence bijection. Returns a description of the
    /// first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let inner = self.inner.read();
        if inner.index.len() != inner.items.len() {
            return Err(format!(
                "index has {} keys but sequence has {} entries",
                inner.index.len(),
                inner.items.len()
            ));
        }
        let mut seen = vec![false; inner.items.len()];
        for (key, &pos) in &inner.index {
            let Some(item) = inner.items.get(pos) else {
                return Err(format!("key {key} points past the end ({pos})"));
            };
            if item.cache_key() != *key {
                return Err(format!(
                    "key {key} points at position {pos} holding {}",
                    item.cache_key()
                ));
            }
            if std::mem::replace(&mut seen[pos], true) {
                return Err(format!("position {pos} is referenced twice"));
            }
        }
        Ok(())
    }
}

impl<V: CacheableEntity> EntityCache<V> for MemoryEntityCache<V> {
    fn get(&self, key: &str) -> CacheResult<V> {
        self.inner
            .read()
            .lookup(key)
            .cloned()
            .ok_or_else(|| CacheError::KeyNotFound {
                key: key.to_string(),
            })
    }

    fn set(&self, value: V) -> CacheResult<()> {
        let key = value.cache_key();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        upsert(&mut inner.items, &mut inner.index, value);
        inner.journal.record(&key, WriteKind::Upserted);
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        // A miss is still journaled: a snapshot fetched before the store
        // delete committed must not bring the entity back.
        inner.journal.record(key, WriteKind::Deleted);

        let pos = inner
            .index
            .remove(key)
            .ok_or_else(|| CacheError::KeyNotFound {
                key: key.to_string(),
            })?;

        inner.items.remove(pos);
        for item in &inner.items[pos..] {
            if let Some(shifted) = inner.index.get_mut(&item.cache_key()) {
                *shifted -= 1;
            }
        }
        Ok(())
    }

    fn get_list(&self, limit: usize, offset: usize) -> Vec<V> {
        let inner = self.inner.read();
        let len = inner.items.len();
        let start = offset.min(len);
        let end = start.saturating_add(limit).min(len);
        inner.items[start..end].to_vec()
    }

    fn replace(&self, values: Vec<V>) -> CacheResult<()> {
        let mut items = Vec::with_capacity(values.len());
        let mut index = HashMap::with_capacity(values.len());
        for value in values {
            upsert(&mut items, &mut index, value);
        }

        let mut inner = self.inner.write();
        inner.items = items;
        inner.index = index;
        inner.journal.clear();
        inner.last_replaced_at = Some(Utc::now());
        inner.replacements += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            entries: inner.items.len(),
            warm: inner.last_replaced_at.is_some(),
            last_replaced_at: inner.last_replaced_at,
            replacements: inner.replacements,
            tracked_writes: inner.journal.len(),
        }
    }

    fn watermark(&self) -> Watermark {
        self.inner.read().journal.current()
    }

    fn replace_since(&self, values: Vec<V>, since: Watermark) -> CacheResult<()> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut items = Vec::with_capacity(values.len());
        let mut index = HashMap::with_capacity(values.len());

        for value in values {
            let key = value.cache_key();
            match inner.journal.written_since(&key, since) {
                Some(WriteKind::Deleted) => {}
                Some(WriteKind::Upserted) => {
                    let local = inner.lookup(&key).cloned().unwrap_or(value);
                    upsert(&mut items, &mut index, local);
                }
                None => upsert(&mut items, &mut index, value),
            }
        }

        // Local upserts the snapshot does not know about yet.
        for local in &inner.items {
            let key = local.cache_key();
            if !index.contains_key(&key)
                && inner.journal.written_since(&key, since) == Some(WriteKind::Upserted)
            {
                upsert(&mut items, &mut index, local.clone());
            }
        }

        inner.items = items;
        inner.index = index;
        inner.journal.prune_through(since);
        inner.last_replaced_at = Some(Utc::now());
        inner.replacements += 1;
        Ok(())
    }
}
