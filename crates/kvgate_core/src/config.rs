//! Sparse caller configuration and its translation into typed options.
//!
//! Each config struct is a closed schema: the recognized field names are
//! exactly the ones the serde rename table declares, and unknown keys are
//! rejected at deserialization. Every field is optional; translation
//! resolves the sparse surface into an immutable option snapshot with the
//! documented defaults.

use crate::error::{Error, GatewayResult};
use crate::types::OutputEncoding;
use kvgate_engine::{Cache, OpenOptions, ReadOptions, WriteOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for opening a database.
///
/// Defaults when a field (or the whole object) is omitted:
/// create-if-missing true, error-if-exists false, compression enabled,
/// 4 MiB write buffer, 4 KiB blocks, 1000 open files, restart interval 16,
/// no cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct OpenConfig {
    /// Block-cache size in bytes; a positive value allocates a cache.
    pub cache_size: Option<i64>,
    /// Whether block compression is enabled.
    pub compression: Option<bool>,
    /// Whether to create the keyspace if it doesn't exist.
    pub create_if_missing: Option<bool>,
    /// Whether to error if the keyspace already exists.
    pub error_if_exists: Option<bool>,
    /// Write buffer size in bytes.
    pub write_buffer_size: Option<usize>,
    /// Block size in bytes.
    pub block_size: Option<usize>,
    /// Maximum number of open files.
    pub max_open_files: Option<u32>,
    /// Keys between restart points within a block.
    pub block_restart_interval: Option<u32>,
}

impl OpenConfig {
    /// Creates an empty configuration (every field defaulted).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block-cache size in bytes.
    #[must_use]
    pub fn cache_size(mut self, value: i64) -> Self {
        self.cache_size = Some(value);
        self
    }

    /// Sets whether block compression is enabled.
    #[must_use]
    pub fn compression(mut self, value: bool) -> Self {
        self.compression = Some(value);
        self
    }

    /// Sets whether to create the keyspace if missing.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = Some(value);
        self
    }

    /// Sets whether to error if the keyspace exists.
    #[must_use]
    pub fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = Some(value);
        self
    }

    /// Resolves this sparse configuration into an option snapshot.
    ///
    /// A positive `cache_size` allocates the block cache here, before any
    /// engine call; the resulting resource is attached to the options and
    /// becomes exclusively owned by the database handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] if the cache cannot be allocated.
    pub fn resolve(&self) -> GatewayResult<OpenOptions> {
        let mut options = OpenOptions::default();
        if let Some(compression) = self.compression {
            options.compression = compression;
        }
        if let Some(create_if_missing) = self.create_if_missing {
            options.create_if_missing = create_if_missing;
        }
        if let Some(error_if_exists) = self.error_if_exists {
            options.error_if_exists = error_if_exists;
        }
        if let Some(write_buffer_size) = self.write_buffer_size {
            options.write_buffer_size = write_buffer_size;
        }
        if let Some(block_size) = self.block_size {
            options.block_size = block_size;
        }
        if let Some(max_open_files) = self.max_open_files {
            options.max_open_files = max_open_files;
        }
        if let Some(block_restart_interval) = self.block_restart_interval {
            options.block_restart_interval = block_restart_interval;
        }
        if let Some(cache_size) = self.cache_size {
            if cache_size > 0 {
                // try_from rather than `as`: a large positive i64 must not
                // wrap into a small capacity on 32-bit targets.
                let capacity = usize::try_from(cache_size).map_err(|_| {
                    Error::resource(format!("cannot allocate a {cache_size} byte block-cache"))
                })?;
                let cache = Cache::with_capacity(capacity)
                    .map_err(|error| Error::resource(error.to_string()))?;
                options.block_cache = Some(Arc::new(cache));
            }
        }
        Ok(options)
    }
}

/// Configuration for a single write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct WriteConfig {
    /// Whether the write must reach durable storage before completing.
    pub sync: Option<bool>,
}

impl WriteConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sync flag.
    #[must_use]
    pub fn sync(mut self, value: bool) -> Self {
        self.sync = Some(value);
        self
    }

    /// Resolves this configuration into a write-option snapshot.
    pub fn resolve(&self) -> WriteOptions {
        WriteOptions {
            sync: self.sync.unwrap_or(false),
        }
    }
}

/// Configuration for a single read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ReadConfig {
    /// Whether to verify checksums for this read.
    pub verify_checksums: Option<bool>,
    /// Whether this read populates the block cache. Defaults to true when a
    /// configuration object is present.
    pub fill_cache: Option<bool>,
    /// Deliver the result as raw bytes (true, the default) or as text.
    pub as_buffer: Option<bool>,
}

impl ReadConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets checksum verification.
    #[must_use]
    pub fn verify_checksums(mut self, value: bool) -> Self {
        self.verify_checksums = Some(value);
        self
    }

    /// Sets cache population.
    #[must_use]
    pub fn fill_cache(mut self, value: bool) -> Self {
        self.fill_cache = Some(value);
        self
    }

    /// Sets byte (true) vs text (false) delivery.
    #[must_use]
    pub fn as_buffer(mut self, value: bool) -> Self {
        self.as_buffer = Some(value);
        self
    }

    /// Resolves this configuration into a read-option snapshot and the
    /// payload encoding.
    ///
    /// `fill_cache_default` preserves the presence-vs-omission distinction:
    /// a present object with the field omitted takes this default, while
    /// the bare iterator-creation call with no object at all passes false.
    pub fn resolve(&self, fill_cache_default: bool) -> (ReadOptions, OutputEncoding) {
        let options = ReadOptions {
            verify_checksums: self.verify_checksums.unwrap_or(false),
            fill_cache: self.fill_cache.unwrap_or(fill_cache_default),
        };
        let encoding = if self.as_buffer.unwrap_or(true) {
            OutputEncoding::Bytes
        } else {
            OutputEncoding::Text
        };
        (options, encoding)
    }
}

/// Configuration for one cursor session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct IterConfig {
    /// Key to seek to before the first step.
    pub start: Option<Vec<u8>>,
    /// Inclusive end bound for the walk.
    pub end: Option<Vec<u8>>,
    /// Walk in descending key order.
    pub reverse: Option<bool>,
    /// Project keys into delivered entries (default true).
    pub keys: Option<bool>,
    /// Project values into delivered entries (default true).
    pub values: Option<bool>,
    /// Maximum number of payload-bearing steps; negative means unlimited.
    pub limit: Option<i64>,
    /// Whether iteration reads populate the block cache.
    pub fill_cache: Option<bool>,
    /// Deliver keys as raw bytes (true, the default) or as text.
    pub key_as_buffer: Option<bool>,
    /// Deliver values as raw bytes (true, the default) or as text.
    pub value_as_buffer: Option<bool>,
}

impl IterConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start bound.
    #[must_use]
    pub fn start(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.start = Some(key.into());
        self
    }

    /// Sets the inclusive end bound.
    #[must_use]
    pub fn end(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.end = Some(key.into());
        self
    }

    /// Sets the walk direction.
    #[must_use]
    pub fn reverse(mut self, value: bool) -> Self {
        self.reverse = Some(value);
        self
    }

    /// Sets the step limit.
    #[must_use]
    pub fn limit(mut self, value: i64) -> Self {
        self.limit = Some(value);
        self
    }

    /// Sets key projection.
    #[must_use]
    pub fn keys(mut self, value: bool) -> Self {
        self.keys = Some(value);
        self
    }

    /// Sets value projection.
    #[must_use]
    pub fn values(mut self, value: bool) -> Self {
        self.values = Some(value);
        self
    }

    /// Resolves this configuration into the read-option snapshot for the
    /// underlying iterator and the cursor's own controls.
    pub fn resolve(&self) -> (ReadOptions, IterOptions) {
        let read_options = ReadOptions {
            verify_checksums: false,
            fill_cache: self.fill_cache.unwrap_or(true),
        };
        let iter_options = IterOptions {
            start: self.start.clone(),
            end: self.end.clone(),
            reverse: self.reverse.unwrap_or(false),
            keys: self.keys.unwrap_or(true),
            values: self.values.unwrap_or(true),
            limit: self.limit.filter(|limit| *limit >= 0).map(|limit| limit as u64),
            key_encoding: encoding_for(self.key_as_buffer),
            value_encoding: encoding_for(self.value_as_buffer),
        };
        (read_options, iter_options)
    }
}

fn encoding_for(as_buffer: Option<bool>) -> OutputEncoding {
    if as_buffer.unwrap_or(true) {
        OutputEncoding::Bytes
    } else {
        OutputEncoding::Text
    }
}

/// Resolved cursor controls: an immutable snapshot for one session.
#[derive(Debug, Clone)]
pub struct IterOptions {
    /// Key to seek to before the first step.
    pub start: Option<Vec<u8>>,
    /// Inclusive end bound.
    pub end: Option<Vec<u8>>,
    /// Descending walk.
    pub reverse: bool,
    /// Project keys.
    pub keys: bool,
    /// Project values.
    pub values: bool,
    /// Step budget; `None` is unlimited.
    pub limit: Option<u64>,
    /// Encoding for projected keys.
    pub key_encoding: OutputEncoding,
    /// Encoding for projected values.
    pub value_encoding: OutputEncoding,
}
