//! The database handle: lifecycle guard and caller-facing request surface.

use crate::batch::{BatchBuilder, BatchOp};
use crate::config::{IterConfig, OpenConfig, ReadConfig, WriteConfig};
use crate::cursor::Cursor;
use crate::dispatcher::{Dispatcher, JobTicket, DEFAULT_WORKERS};
use crate::error::{Error, GatewayResult};
use crate::status::Status;
use crate::types::{Datum, OutputEncoding};
use kvgate_engine::{Backend, Cache, Engine, ReadOptions};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Lifecycle state of a database handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Never opened.
    Unopened,
    /// An open job is in flight.
    Opening,
    /// Open; data operations are accepted.
    Open,
    /// A close job is in flight.
    Closing,
    /// Closed; may be reopened.
    Closed,
}

struct Lifecycle {
    state: HandleState,
    engine: Option<Arc<dyn Engine>>,
    cache: Option<Arc<Cache>>,
}

struct DbInner {
    backend: Arc<dyn Backend>,
    path: PathBuf,
    dispatcher: Dispatcher,
    lifecycle: Mutex<Lifecycle>,
}

/// An asynchronous handle to one database.
///
/// All handle-lifecycle and single-shot data operations are offloaded to a
/// bounded worker pool; each call validates synchronously, then returns a
/// [`JobTicket`] carrying the single asynchronous completion. Cursor
/// stepping is the one exception: it runs inline on the caller's context
/// (see [`Cursor`]).
///
/// Lifecycle transitions are serialized by the handle itself: a second
/// open or close while one is in flight is rejected synchronously with
/// [`Error::Handle`] rather than left to caller discipline. Concurrent data
/// operations against an open handle are safe and may complete in any
/// order.
///
/// The handle exclusively owns the engine instance and the optionally
/// allocated block cache; both are released exactly once when the close job
/// runs. A data job still in flight keeps the engine alive until it
/// finishes.
#[derive(Clone)]
pub struct Db {
    inner: Arc<DbInner>,
}

impl Db {
    /// Creates an unopened handle for the keyspace at `path`.
    pub fn new(backend: impl Backend, path: impl Into<PathBuf>) -> Self {
        Self::with_workers(backend, path, DEFAULT_WORKERS)
    }

    /// Creates an unopened handle with an explicit worker-pool size.
    pub fn with_workers(backend: impl Backend, path: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            inner: Arc::new(DbInner {
                backend: Arc::new(backend),
                path: path.into(),
                dispatcher: Dispatcher::new(workers),
                lifecycle: Mutex::new(Lifecycle {
                    state: HandleState::Unopened,
                    engine: None,
                    cache: None,
                }),
            }),
        }
    }

    /// The keyspace path this handle is bound to.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// The handle's current lifecycle state.
    pub fn state(&self) -> HandleState {
        self.inner.lifecycle.lock().state
    }

    /// Opens the database.
    ///
    /// Option resolution (including block-cache allocation) happens here,
    /// synchronously, before any engine call; the open itself runs on the
    /// worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] if the cache cannot be allocated, or
    /// [`Error::Handle`] if the handle is not in an openable state. An
    /// engine-reported open failure arrives through the ticket.
    pub fn open(&self, config: Option<OpenConfig>) -> GatewayResult<JobTicket<()>> {
        let options = config.unwrap_or_default().resolve()?;
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            match lifecycle.state {
                HandleState::Unopened | HandleState::Closed => {
                    lifecycle.state = HandleState::Opening;
                }
                state => {
                    return Err(Error::handle(format!(
                        "cannot open a handle in state {state:?}"
                    )));
                }
            }
        }
        debug!(path = %self.inner.path.display(), "opening database");

        let inner = Arc::clone(&self.inner);
        Ok(self.inner.dispatcher.submit("open", move || {
            let cache = options.block_cache.clone();
            match inner.backend.open(&options, &inner.path) {
                Ok(engine) => {
                    let mut lifecycle = inner.lifecycle.lock();
                    lifecycle.engine = Some(Arc::from(engine));
                    lifecycle.cache = cache;
                    lifecycle.state = HandleState::Open;
                    Ok(())
                }
                Err(error) => {
                    inner.lifecycle.lock().state = HandleState::Closed;
                    Err(Error::Engine {
                        status: Status::from_engine(&error),
                        message: format!(
                            "failed to open database at {}: {error}",
                            inner.path.display()
                        ),
                    })
                }
            }
        }))
    }

    /// Closes the database, releasing the engine and the cache resource.
    ///
    /// Closing an already-closed (or never-opened) handle is a successful
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handle`] while an open or close is already in
    /// flight.
    pub fn close(&self) -> GatewayResult<JobTicket<()>> {
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            match lifecycle.state {
                HandleState::Open => {
                    lifecycle.state = HandleState::Closing;
                }
                HandleState::Closed | HandleState::Unopened => {
                    return Ok(self.inner.dispatcher.submit("close-noop", || Ok(())));
                }
                state => {
                    return Err(Error::handle(format!(
                        "cannot close a handle in state {state:?}"
                    )));
                }
            }
        }
        debug!(path = %self.inner.path.display(), "closing database");

        let inner = Arc::clone(&self.inner);
        Ok(self.inner.dispatcher.submit("close", move || {
            let mut lifecycle = inner.lifecycle.lock();
            // The last in-flight data job may briefly extend the engine's
            // life through its own Arc; the handle's ownership ends here.
            lifecycle.engine = None;
            lifecycle.cache = None;
            lifecycle.state = HandleState::Closed;
            Ok(())
        }))
    }

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty key, or [`Error::Handle`]
    /// if the database is not open. Engine failures arrive through the
    /// ticket.
    pub fn put(
        &self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        config: Option<WriteConfig>,
    ) -> GatewayResult<JobTicket<()>> {
        let key = key.into();
        let value = value.into();
        validate_key(&key)?;
        let options = config.unwrap_or_default().resolve();
        let engine = self.engine()?;
        Ok(self
            .inner
            .dispatcher
            .submit("put", move || Ok(engine.put(&options, &key, &value)?)))
    }

    /// Reads the value stored under `key`, decoded per the read config.
    ///
    /// A missing key is delivered through the ticket as an engine error
    /// with [`Status::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty key, or [`Error::Handle`]
    /// if the database is not open.
    pub fn get(
        &self,
        key: impl Into<Vec<u8>>,
        config: Option<ReadConfig>,
    ) -> GatewayResult<JobTicket<Datum>> {
        let key = key.into();
        validate_key(&key)?;
        let (options, encoding) = match config {
            Some(config) => config.resolve(true),
            None => (ReadOptions::default(), OutputEncoding::Bytes),
        };
        let engine = self.engine()?;
        Ok(self.inner.dispatcher.submit("get", move || {
            let bytes = engine.get(&options, &key)?;
            Ok(encoding.decode(bytes))
        }))
    }

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty key, or [`Error::Handle`]
    /// if the database is not open.
    pub fn del(
        &self,
        key: impl Into<Vec<u8>>,
        config: Option<WriteConfig>,
    ) -> GatewayResult<JobTicket<()>> {
        let key = key.into();
        validate_key(&key)?;
        let options = config.unwrap_or_default().resolve();
        let engine = self.engine()?;
        Ok(self
            .inner
            .dispatcher
            .submit("del", move || Ok(engine.delete(&options, &key)?)))
    }

    /// Applies `ops` as one atomic write.
    ///
    /// Every operation is validated here, before submission; one invalid
    /// operation rejects the whole batch and nothing is applied. An empty
    /// batch completes successfully without an engine call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed operation, or
    /// [`Error::Handle`] if the database is not open.
    pub fn batch(
        &self,
        ops: Vec<BatchOp>,
        config: Option<WriteConfig>,
    ) -> GatewayResult<JobTicket<()>> {
        let batch = BatchBuilder::build(ops)?;
        let options = config.unwrap_or_default().resolve();
        let engine = self.engine()?;
        Ok(self.inner.dispatcher.submit("batch", move || {
            if batch.is_empty() {
                return Ok(());
            }
            Ok(engine.write(&options, batch)?)
        }))
    }

    /// Approximate number of bytes used by keys in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handle`] if the database is not open.
    pub fn approximate_size(
        &self,
        start: impl Into<Vec<u8>>,
        end: impl Into<Vec<u8>>,
    ) -> GatewayResult<JobTicket<u64>> {
        let start = start.into();
        let end = end.into();
        let engine = self.engine()?;
        Ok(self
            .inner
            .dispatcher
            .submit("approximate-size", move || {
                Ok(engine.approximate_size(&start, &end))
            }))
    }

    /// Reads an engine property, synchronously.
    ///
    /// Returns `None` for an unknown property or when the database is not
    /// open.
    pub fn property(&self, name: &str) -> Option<String> {
        let engine = {
            let lifecycle = self.inner.lifecycle.lock();
            lifecycle.engine.clone()?
        };
        engine.property(name)
    }

    /// Creates a cursor session over a read snapshot.
    ///
    /// Creation runs on the worker pool like any other job; the returned
    /// cursor is then stepped inline on the caller's context. With no
    /// configuration object at all, iteration reads do not populate the
    /// block cache; an empty configuration object leaves cache population
    /// on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Handle`] if the database is not open.
    pub fn iterator(&self, config: Option<IterConfig>) -> GatewayResult<JobTicket<Cursor>> {
        let (read_options, iter_options) = match config {
            Some(config) => config.resolve(),
            None => {
                let (mut read_options, iter_options) = IterConfig::new().resolve();
                // Omitting the whole object defaults fill-cache off; an
                // empty object present defaults it on.
                read_options.fill_cache = false;
                (read_options, iter_options)
            }
        };
        let engine = self.engine()?;
        Ok(self.inner.dispatcher.submit("iterator", move || {
            Ok(Cursor::new(engine.iterator(&read_options), iter_options))
        }))
    }

    /// Repairs the keyspace at `path` as best the engine can.
    ///
    /// Path-level: does not touch this handle's lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] if the config requests an unallocatable
    /// cache. Engine failures arrive through the ticket.
    pub fn repair(
        &self,
        path: impl Into<PathBuf>,
        config: Option<OpenConfig>,
    ) -> GatewayResult<JobTicket<()>> {
        let options = config.unwrap_or_default().resolve()?;
        let path = path.into();
        let backend = Arc::clone(&self.inner.backend);
        Ok(self
            .inner
            .dispatcher
            .submit("repair", move || Ok(backend.repair(&path, &options)?)))
    }

    /// Destroys the keyspace at `path`, removing all of its data.
    ///
    /// Path-level: does not touch this handle's lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] if the config requests an unallocatable
    /// cache. Engine failures arrive through the ticket.
    pub fn destroy(
        &self,
        path: impl Into<PathBuf>,
        config: Option<OpenConfig>,
    ) -> GatewayResult<JobTicket<()>> {
        let options = config.unwrap_or_default().resolve()?;
        let path = path.into();
        let backend = Arc::clone(&self.inner.backend);
        Ok(self
            .inner
            .dispatcher
            .submit("destroy", move || Ok(backend.destroy(&path, &options)?)))
    }

    /// Snapshot of the engine reference for one data job.
    fn engine(&self) -> GatewayResult<Arc<dyn Engine>> {
        let lifecycle = self.inner.lifecycle.lock();
        match (&lifecycle.state, &lifecycle.engine) {
            (HandleState::Open, Some(engine)) => Ok(Arc::clone(engine)),
            _ => Err(Error::handle("database is not open")),
        }
    }
}

fn validate_key(key: &[u8]) -> GatewayResult<()> {
    if key.is_empty() {
        return Err(Error::validation("`key` must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvgate_engine::MemoryBackend;

    fn open_db(path: &str) -> Db {
        let db = Db::with_workers(MemoryBackend::new(), path, 1);
        db.open(None).unwrap().wait().unwrap();
        db
    }

    #[test]
    fn open_transitions_to_open() {
        let db = Db::new(MemoryBackend::new(), "db");
        assert_eq!(db.state(), HandleState::Unopened);
        db.open(None).unwrap().wait().unwrap();
        assert_eq!(db.state(), HandleState::Open);
    }

    #[test]
    fn second_open_is_rejected_synchronously() {
        let db = open_db("db");
        assert!(matches!(db.open(None), Err(Error::Handle { .. })));
    }

    #[test]
    fn close_is_idempotent() {
        let db = open_db("db");
        db.close().unwrap().wait().unwrap();
        assert_eq!(db.state(), HandleState::Closed);
        // Closing again is a successful no-op.
        db.close().unwrap().wait().unwrap();
        assert_eq!(db.state(), HandleState::Closed);
    }

    #[test]
    fn reopen_after_close() {
        let db = open_db("db");
        db.put("k", "v", None).unwrap().wait().unwrap();
        db.close().unwrap().wait().unwrap();
        db.open(None).unwrap().wait().unwrap();
        let datum = db.get("k", None).unwrap().wait().unwrap();
        assert_eq!(datum.as_bytes(), b"v");
    }

    #[test]
    fn data_op_before_open_is_rejected() {
        let db = Db::new(MemoryBackend::new(), "db");
        assert!(matches!(
            db.put("k", "v", None),
            Err(Error::Handle { .. })
        ));
        assert!(matches!(db.get("k", None), Err(Error::Handle { .. })));
        assert!(matches!(db.iterator(None), Err(Error::Handle { .. })));
    }

    #[test]
    fn open_failure_reports_through_ticket_and_allows_retry() {
        let db = Db::with_workers(MemoryBackend::new(), "db", 1);
        let config = OpenConfig::new().create_if_missing(false);
        let error = db.open(Some(config)).unwrap().wait().unwrap_err();
        assert_eq!(error.status(), Some(Status::Unknown));
        assert_eq!(db.state(), HandleState::Closed);

        db.open(None).unwrap().wait().unwrap();
        assert_eq!(db.state(), HandleState::Open);
    }

    #[test]
    fn empty_key_is_a_validation_error() {
        let db = open_db("db");
        assert!(matches!(
            db.put(Vec::new(), b"v".to_vec(), None),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            db.get(Vec::new(), None),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            db.del(Vec::new(), None),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn fire_and_forget_still_applies() {
        // One worker serializes the queue, so the follow-up read observes
        // the discarded put.
        let db = open_db("db");
        drop(db.put("k", "v", None).unwrap());
        let datum = db.get("k", None).unwrap().wait().unwrap();
        assert_eq!(datum.as_bytes(), b"v");
    }

    #[test]
    fn property_is_none_when_not_open() {
        let db = Db::new(MemoryBackend::new(), "db");
        assert!(db.property("kvgate.num-entries").is_none());

        let db = open_db("db2");
        assert_eq!(db.property("kvgate.num-entries").as_deref(), Some("0"));
    }

    #[test]
    fn repair_and_destroy_are_path_level() {
        let db = Db::with_workers(MemoryBackend::new(), "db", 1);
        db.repair("other", None).unwrap().wait().unwrap();
        db.destroy("other", None).unwrap().wait().unwrap();
        assert_eq!(db.state(), HandleState::Unopened);
    }
}
