//! In-process entity cache.
//!
//! The cache mirrors the authoritative store for reads. It is replaced
//! wholesale by the refresh job and patched point-wise after successful
//! writes. See [`MemoryEntityCache`] for the data layout.
//!
//! # Components
//!
//! - [`CacheableEntity`]: contract every cached value satisfies (a stable key)
//! - [`EntityCache`]: the operations the orchestrator relies on
//! - [`MemoryEntityCache`]: sequence + index map behind one read-write lock
//! - [`WriteJournal`] / [`Watermark`]: per-key record of local writes, used to
//!   keep a refresh snapshot from clobbering newer writes

mod memory;
mod traits;
mod watermark;

pub use memory::MemoryEntityCache;
pub use traits::{CacheResult, CacheStats, CacheableEntity, EntityCache};
pub use watermark::{Watermark, WriteJournal, WriteKind};
