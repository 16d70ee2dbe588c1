//! Write watermark and local write journal.
//!
//! A refresh fetches a snapshot from the store while writes keep landing in
//! the cache. The journal records, per key, the sequence number of the last
//! local write. A refresh captures the watermark before fetching; on install,
//! keys written after that watermark keep their local state.

use std::collections::HashMap;

/// A point in the local write history.
///
/// Watermarks are monotonically increasing. Every `set` or `delete` on the
/// cache advances the sequence by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Watermark {
    pub sequence: u64,
}

impl Watermark {
    pub fn new(sequence: u64) -> Self {
        Self { sequence }
    }

    /// Beginning of history.
    pub fn zero() -> Self {
        Self { sequence: 0 }
    }

    pub fn is_newer_than(&self, other: &Watermark) -> bool {
        self.sequence > other.sequence
    }

    pub fn is_at_least(&self, other: &Watermark) -> bool {
        self.sequence >= other.sequence
    }
}

/// What the last local write did to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Upserted,
    Deleted,
}

#[derive(Debug, Clone, Copy)]
struct WriteRecord {
    sequence: u64,
    kind: WriteKind,
}

/// Per-key record of local writes since the last reconciliation.
///
/// Not synchronized on its own; the owning cache keeps it under the same
/// lock as the data it describes.
#[derive(Debug, Default)]
pub struct WriteJournal {
    sequence: u64,
    writes: HashMap<String, WriteRecord>,
}

impl WriteJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write and return the watermark it produced.
    pub fn record(&mut self, key: &str, kind: WriteKind) -> Watermark {
        self.sequence += 1;
        self.writes.insert(
            key.to_string(),
            WriteRecord {
                sequence: self.sequence,
                kind,
            },
        );
        Watermark::new(self.sequence)
    }

    pub fn current(&self) -> Watermark {
        Watermark::new(self.sequence)
    }

    /// The last write to `key` if it happened after `since`.
    pub fn written_since(&self, key: &str, since: Watermark) -> Option<WriteKind> {
        self.writes
            .get(key)
            .filter(|record| record.sequence > since.sequence)
            .map(|record| record.kind)
    }

    /// Drop records at or below `through`. Newer records survive for the
    /// next reconciliation.
    pub fn prune_through(&mut self, through: Watermark) {
        self.writes.retain(|_, record| record.sequence > through.sequence);
    }

    /// Forget every record. The sequence keeps counting so watermarks
    /// handed out earlier stay comparable.
    pub fn clear(&mut self) {
        self.writes.clear();
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
