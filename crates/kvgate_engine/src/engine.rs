//! Engine trait definitions and the atomic write batch.

use crate::error::EngineResult;
use crate::options::{OpenOptions, ReadOptions, WriteOptions};
use std::path::Path;

/// Path-level operations of a storage engine.
///
/// A backend knows how to open, repair, and destroy keyspaces identified by
/// a filesystem path. Opening yields an [`Engine`] instance; repair and
/// destroy operate on closed keyspaces.
///
/// # Implementors
///
/// - [`crate::MemoryBackend`] - in-process reference engine
pub trait Backend: Send + Sync + 'static {
    /// Opens the keyspace at `path`, creating it if the options allow.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyspace is missing and `create_if_missing`
    /// is false, if it exists and `error_if_exists` is true, or on any
    /// engine-level failure.
    fn open(&self, options: &OpenOptions, path: &Path) -> EngineResult<Box<dyn Engine>>;

    /// Repairs the keyspace at `path` as best it can.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyspace cannot be brought back to a
    /// readable state.
    fn repair(&self, path: &Path, options: &OpenOptions) -> EngineResult<()>;

    /// Destroys the keyspace at `path`, removing all of its data.
    ///
    /// # Errors
    ///
    /// Returns an error if the keyspace's data cannot be removed.
    fn destroy(&self, path: &Path, options: &OpenOptions) -> EngineResult<()>;
}

/// Data operations on one open engine instance.
///
/// # Invariants
///
/// - Implementations are internally thread-safe: concurrent data operations
///   against the same instance are safe and may interleave freely.
/// - Calls may block; the gateway runs them on a worker pool, never on the
///   caller's context.
/// - [`Engine::write`] applies its batch atomically: all operations commit
///   or none do, including across a crash mid-write.
pub trait Engine: Send + Sync + 'static {
    /// Reads the value stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::NotFound`] if the key does not exist.
    fn get(&self, options: &ReadOptions, key: &[u8]) -> EngineResult<Vec<u8>>;

    /// Stores `value` for `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error on any engine-level write failure.
    fn put(&self, options: &WriteOptions, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Removes `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error on any engine-level write failure.
    fn delete(&self, options: &WriteOptions, key: &[u8]) -> EngineResult<()>;

    /// Applies `batch` as one atomic write.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be committed; in that case
    /// none of its operations were applied.
    fn write(&self, options: &WriteOptions, batch: WriteBatch) -> EngineResult<()>;

    /// Returns the approximate number of bytes used by keys in
    /// `[start, end)`.
    fn approximate_size(&self, start: &[u8], end: &[u8]) -> u64;

    /// Returns the value of an engine property, if the engine knows it.
    fn property(&self, name: &str) -> Option<String>;

    /// Creates an iterator over a read snapshot of the keyspace.
    ///
    /// The iterator observes no writes made after its creation.
    fn iterator(&self, options: &ReadOptions) -> Box<dyn EngineIterator>;
}

/// A blocking iterator over the keyspace.
///
/// Iterators are strictly single-threaded: they are `Send` so a cursor can
/// be created on a worker and handed to the caller, but never shared. The
/// key and value accessors are valid only while [`EngineIterator::valid`]
/// returns true.
pub trait EngineIterator: Send {
    /// Positions at the first key in the keyspace.
    fn seek_to_first(&mut self);

    /// Positions at the last key in the keyspace.
    fn seek_to_last(&mut self);

    /// Positions at the first key at or after `key`.
    fn seek(&mut self, key: &[u8]);

    /// Advances to the next key.
    fn next(&mut self);

    /// Moves back to the previous key.
    fn prev(&mut self);

    /// Whether the iterator is positioned at an element.
    fn valid(&self) -> bool;

    /// The key at the current position.
    fn key(&self) -> &[u8];

    /// The value at the current position.
    fn value(&self) -> &[u8];

    /// The sticky status of the iteration.
    ///
    /// # Errors
    ///
    /// Returns the first error the iteration encountered, if any.
    fn status(&self) -> EngineResult<()>;
}

/// One operation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBatchOp {
    /// Store `value` under `key`.
    Put {
        /// The key to store under.
        key: Vec<u8>,
        /// The value to store.
        value: Vec<u8>,
    },
    /// Remove `key`.
    Delete {
        /// The key to remove.
        key: Vec<u8>,
    },
}

/// An ordered sequence of operations applied atomically by
/// [`Engine::write`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteBatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a put operation.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(WriteBatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Appends a delete operation.
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(WriteBatchOp::Delete { key: key.into() });
    }

    /// Number of operations in the batch.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the batch holds no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The operations in append order.
    pub fn ops(&self) -> &[WriteBatchOp] {
        &self.ops
    }

    /// Consumes the batch, yielding its operations in append order.
    pub fn into_ops(self) -> Vec<WriteBatchOp> {
        self.ops
    }
}
