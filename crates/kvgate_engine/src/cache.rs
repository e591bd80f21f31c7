//! Block cache resource.

use crate::error::{EngineError, EngineResult};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Largest capacity a single cache may be created with (1 TiB).
const MAX_CAPACITY: usize = 1 << 40;

/// A byte-budgeted cache for opaque engine blocks.
///
/// The cache is allocated by the gateway when the caller requests one and
/// is exclusively owned by the database handle for that handle's lifetime;
/// the handle releases its ownership exactly once at close. Engines consult
/// it only for reads with `fill_cache` set.
///
/// Eviction is least-recently-used over whole entries. Entries larger than
/// the total capacity are never admitted.
#[derive(Debug)]
pub struct Cache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<Vec<u8>, CacheEntry>,
    usage: usize,
    clock: u64,
}

#[derive(Debug)]
struct CacheEntry {
    block: Vec<u8>,
    stamp: u64,
}

impl Cache {
    /// Creates a cache with the given byte capacity.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero capacity or one beyond the supported
    /// maximum; the gateway surfaces this as a resource-exhaustion failure
    /// before any engine call is made.
    pub fn with_capacity(capacity: usize) -> EngineResult<Self> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(EngineError::invalid_argument(format!(
                "cannot allocate a {capacity} byte block-cache"
            )));
        }
        Ok(Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        })
    }

    /// Returns the configured byte capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the bytes currently held.
    pub fn usage(&self) -> usize {
        self.inner.lock().usage
    }

    /// Inserts a block, evicting least-recently-used entries to stay within
    /// the byte budget. Oversized blocks are silently skipped.
    pub fn insert(&self, key: &[u8], block: Vec<u8>) {
        let charge = key.len() + block.len();
        if charge > self.capacity {
            return;
        }
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let stamp = inner.clock;
        if let Some(old) = inner.entries.insert(key.to_vec(), CacheEntry { block, stamp }) {
            inner.usage -= key.len() + old.block.len();
        }
        inner.usage += charge;
        while inner.usage > self.capacity {
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stamp)
                .map(|(key, _)| key.clone());
            match victim {
                Some(victim) => {
                    if let Some(entry) = inner.entries.remove(&victim) {
                        inner.usage -= victim.len() + entry.block.len();
                    }
                }
                None => break,
            }
        }
    }

    /// Looks up a block, refreshing its recency on a hit.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let stamp = inner.clock;
        let entry = inner.entries.get_mut(key)?;
        entry.stamp = stamp;
        Some(entry.block.clone())
    }
}
