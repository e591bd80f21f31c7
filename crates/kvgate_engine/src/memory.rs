//! In-process reference engine.

use crate::cache::Cache;
use crate::engine::{Backend, Engine, EngineIterator, WriteBatch, WriteBatchOp};
use crate::error::{EngineError, EngineResult};
use crate::options::{OpenOptions, ReadOptions, WriteOptions};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// An in-process storage backend keeping every keyspace in memory.
///
/// Keyspaces are keyed by path and survive close/reopen for the lifetime of
/// the backend, so handle-lifecycle behaviour can be exercised without
/// touching the filesystem. Suitable for:
/// - Unit and integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Thread Safety
///
/// The backend and the engines it produces are thread-safe; concurrent data
/// operations against one engine may interleave freely. Iterators clone a
/// snapshot of the keyspace at creation and observe no later writes.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    registry: RwLock<HashMap<PathBuf, Arc<Keyspace>>>,
}

#[derive(Debug, Default)]
struct Keyspace {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates a backend with no keyspaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keyspaces currently registered.
    pub fn keyspace_count(&self) -> usize {
        self.registry.read().len()
    }
}

impl Backend for MemoryBackend {
    fn open(&self, options: &OpenOptions, path: &Path) -> EngineResult<Box<dyn Engine>> {
        let mut registry = self.registry.write();
        let exists = registry.contains_key(path);

        if exists && options.error_if_exists {
            return Err(EngineError::invalid_argument(format!(
                "keyspace {} already exists",
                path.display()
            )));
        }
        if !exists && !options.create_if_missing {
            return Err(EngineError::invalid_argument(format!(
                "keyspace {} does not exist",
                path.display()
            )));
        }

        let keyspace = registry
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Keyspace::default()));
        debug!(path = %path.display(), created = !exists, "opened keyspace");

        Ok(Box::new(MemoryEngine {
            keyspace: Arc::clone(keyspace),
            cache: options.block_cache.clone(),
        }))
    }

    fn repair(&self, path: &Path, options: &OpenOptions) -> EngineResult<()> {
        let mut registry = self.registry.write();
        if registry.contains_key(path) {
            return Ok(());
        }
        if options.create_if_missing {
            registry.insert(path.to_path_buf(), Arc::new(Keyspace::default()));
            return Ok(());
        }
        Err(EngineError::invalid_argument(format!(
            "keyspace {} does not exist",
            path.display()
        )))
    }

    fn destroy(&self, path: &Path, _options: &OpenOptions) -> EngineResult<()> {
        // Destroying an absent keyspace is a successful no-op.
        if self.registry.write().remove(path).is_some() {
            debug!(path = %path.display(), "destroyed keyspace");
        }
        Ok(())
    }
}

struct MemoryEngine {
    keyspace: Arc<Keyspace>,
    cache: Option<Arc<Cache>>,
}

impl Engine for MemoryEngine {
    fn get(&self, options: &ReadOptions, key: &[u8]) -> EngineResult<Vec<u8>> {
        let map = self.keyspace.map.read();
        let value = map.get(key).cloned().ok_or(EngineError::NotFound)?;
        if options.fill_cache {
            if let Some(cache) = &self.cache {
                cache.insert(key, value.clone());
            }
        }
        Ok(value)
    }

    fn put(&self, _options: &WriteOptions, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.keyspace.map.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, _options: &WriteOptions, key: &[u8]) -> EngineResult<()> {
        self.keyspace.map.write().remove(key);
        Ok(())
    }

    fn write(&self, _options: &WriteOptions, batch: WriteBatch) -> EngineResult<()> {
        // One write lock for the whole batch: all operations become visible
        // together and a reader never observes a partial application.
        let mut map = self.keyspace.map.write();
        for op in batch.into_ops() {
            match op {
                WriteBatchOp::Put { key, value } => {
                    map.insert(key, value);
                }
                WriteBatchOp::Delete { key } => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn approximate_size(&self, start: &[u8], end: &[u8]) -> u64 {
        let map = self.keyspace.map.read();
        map.range(start.to_vec()..end.to_vec())
            .map(|(key, value)| (key.len() + value.len()) as u64)
            .sum()
    }

    fn property(&self, name: &str) -> Option<String> {
        let map = self.keyspace.map.read();
        match name {
            "kvgate.num-entries" => Some(map.len().to_string()),
            "kvgate.approximate-bytes" => {
                let bytes: usize = map.iter().map(|(k, v)| k.len() + v.len()).sum();
                Some(bytes.to_string())
            }
            _ => None,
        }
    }

    fn iterator(&self, _options: &ReadOptions) -> Box<dyn EngineIterator> {
        let entries: Vec<(Vec<u8>, Vec<u8>)> = self
            .keyspace
            .map
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Box::new(MemoryIterator {
            entries,
            index: 0,
            positioned: false,
        })
    }
}

/// Snapshot iterator over a sorted copy of the keyspace.
struct MemoryIterator {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    index: usize,
    positioned: bool,
}

impl EngineIterator for MemoryIterator {
    fn seek_to_first(&mut self) {
        self.index = 0;
        self.positioned = !self.entries.is_empty();
    }

    fn seek_to_last(&mut self) {
        if self.entries.is_empty() {
            self.positioned = false;
        } else {
            self.index = self.entries.len() - 1;
            self.positioned = true;
        }
    }

    fn seek(&mut self, key: &[u8]) {
        self.index = self.entries.partition_point(|(k, _)| k.as_slice() < key);
        self.positioned = self.index < self.entries.len();
    }

    fn next(&mut self) {
        if self.positioned {
            self.index += 1;
            self.positioned = self.index < self.entries.len();
        }
    }

    fn prev(&mut self) {
        if self.positioned {
            if self.index == 0 {
                self.positioned = false;
            } else {
                self.index -= 1;
            }
        }
    }

    fn valid(&self) -> bool {
        self.positioned
    }

    fn key(&self) -> &[u8] {
        if self.positioned {
            &self.entries[self.index].0
        } else {
            &[]
        }
    }

    fn value(&self) -> &[u8] {
        if self.positioned {
            &self.entries[self.index].1
        } else {
            &[]
        }
    }

    fn status(&self) -> EngineResult<()> {
        Ok(())
    }
}
