//! Typed option snapshots consumed by the engine.
//!
//! Options are resolved once by the gateway from sparse caller
//! configuration and never mutated afterwards.

use crate::cache::Cache;
use std::sync::Arc;

/// Options for opening (or repairing, or destroying) a keyspace.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Whether to create the keyspace if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the keyspace already exists.
    pub error_if_exists: bool,

    /// Whether block compression is enabled.
    pub compression: bool,

    /// Size of the in-memory write buffer before it is flushed.
    pub write_buffer_size: usize,

    /// Size of one on-disk block.
    pub block_size: usize,

    /// Maximum number of files the engine may keep open.
    pub max_open_files: u32,

    /// Number of keys between restart points within a block.
    pub block_restart_interval: u32,

    /// Optional block cache, exclusively owned by the database handle.
    pub block_cache: Option<Arc<Cache>>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            compression: true,
            write_buffer_size: 4 << 20, // 4 MiB
            block_size: 4 << 10,        // 4 KiB
            max_open_files: 1000,
            block_restart_interval: 16,
            block_cache: None,
        }
    }
}

/// Options for a single read or for one iterator's lifetime.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Whether to verify checksums on every block read.
    pub verify_checksums: bool,

    /// Whether blocks read on behalf of this request populate the cache.
    pub fill_cache: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            verify_checksums: false,
            fill_cache: true,
        }
    }
}

/// Options for a single write.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Whether the write must be synced to durable storage before returning.
    pub sync: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_defaults() {
        let options = OpenOptions::default();
        assert!(options.create_if_missing);
        assert!(!options.error_if_exists);
        assert!(options.compression);
        assert_eq!(options.write_buffer_size, 4 * 1024 * 1024);
        assert_eq!(options.block_size, 4 * 1024);
        assert_eq!(options.max_open_files, 1000);
        assert_eq!(options.block_restart_interval, 16);
        assert!(options.block_cache.is_none());
    }

    #[test]
    fn read_defaults() {
        let options = ReadOptions::default();
        assert!(!options.verify_checksums);
        assert!(options.fill_cache);
    }

    #[test]
    fn write_defaults() {
        assert!(!WriteOptions::default().sync);
    }
}
