//! # kvgate engine
//!
//! Storage-engine collaborator surface for the kvgate gateway.
//!
//! This crate defines the blocking, internally thread-safe engine contract
//! that the gateway offloads work onto:
//!
//! - [`Backend`] - path-level operations (open, repair, destroy)
//! - [`Engine`] - data operations on one open instance
//! - [`EngineIterator`] - a strictly single-threaded iteration primitive
//!
//! plus the typed option snapshots the engine consumes ([`OpenOptions`],
//! [`ReadOptions`], [`WriteOptions`]), the atomic [`WriteBatch`], and the
//! optionally allocated block [`Cache`] resource.
//!
//! ## Reference engine
//!
//! [`MemoryBackend`] is an in-process reference engine suitable for tests
//! and ephemeral keyspaces. It honours the full contract, including read
//! snapshots for iterators and atomic batch writes.
//!
//! ## Example
//!
//! ```rust
//! use kvgate_engine::{Backend, MemoryBackend, OpenOptions, ReadOptions, WriteOptions};
//! use std::path::Path;
//!
//! let backend = MemoryBackend::new();
//! let engine = backend.open(&OpenOptions::default(), Path::new("demo")).unwrap();
//! engine.put(&WriteOptions::default(), b"k", b"v").unwrap();
//! assert_eq!(engine.get(&ReadOptions::default(), b"k").unwrap(), b"v");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod engine;
mod error;
mod memory;
mod options;

pub use cache::Cache;
pub use engine::{Backend, Engine, EngineIterator, WriteBatch, WriteBatchOp};
pub use error::{EngineError, EngineResult};
pub use memory::MemoryBackend;
pub use options::{OpenOptions, ReadOptions, WriteOptions};
