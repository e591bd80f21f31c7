//! # kvgate core
//!
//! Asynchronous gateway between a single-threaded caller and a blocking,
//! internally thread-safe key-value storage engine.
//!
//! The gateway's job is narrow and sharp:
//! - run potentially slow engine calls on a bounded worker pool so the
//!   caller's context never stalls ([`Db`], the job dispatcher);
//! - deliver each completion exactly once through an owned ticket
//!   ([`JobTicket`]);
//! - translate sparse caller configuration into typed, defaulted option
//!   snapshots ([`OpenConfig`], [`ReadConfig`], [`WriteConfig`],
//!   [`IterConfig`]);
//! - validate and accumulate atomic write batches ([`BatchBuilder`]);
//! - expose a pull-based cursor over the engine's strictly single-threaded
//!   iterator, stepped inline on the caller's own context ([`Cursor`]);
//! - map engine outcomes onto a closed status taxonomy ([`Status`]).
//!
//! ## Example
//!
//! ```rust
//! use kvgate_core::Db;
//! use kvgate_engine::MemoryBackend;
//!
//! let db = Db::new(MemoryBackend::new(), "example");
//! db.open(None).unwrap().wait().unwrap();
//! db.put("hello", "world", None).unwrap().wait().unwrap();
//! let value = db.get("hello", None).unwrap().wait().unwrap();
//! assert_eq!(value.as_bytes(), b"world");
//! db.close().unwrap().wait().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod config;
mod cursor;
mod db;
mod dispatcher;
mod error;
mod status;
mod types;

pub use batch::{BatchBuilder, BatchOp};
pub use config::{IterConfig, IterOptions, OpenConfig, ReadConfig, WriteConfig};
pub use cursor::Cursor;
pub use db::{Db, HandleState};
pub use dispatcher::{JobTicket, DEFAULT_WORKERS};
pub use error::{Error, GatewayResult};
pub use status::Status;
pub use types::{Datum, Entry, OutputEncoding};
