//! Pull-based cursor sessions over the engine's iteration primitive.

use crate::config::IterOptions;
use crate::error::{Error, GatewayResult};
use crate::types::Entry;
use kvgate_engine::EngineIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Positioned,
    Exhausted,
    Disposed,
}

/// One live iteration over a read snapshot of the keyspace.
///
/// A cursor binds exactly one engine iterator; creation positions it at the
/// configured start bound, or at the natural first (forward) / last
/// (reverse) element. Each [`Cursor::step`] delivers the projected entry at
/// the current position and advances one element; when the position is
/// invalid, the end bound is passed, or the step budget is spent, it
/// delivers end-of-sequence and the session is exhausted.
///
/// # Execution model
///
/// `step()` runs inline on the caller's own context, never on the worker
/// pool: the underlying iterator is not safe for concurrent use, and
/// `&mut self` is the single-in-flight guard. A long element-at-a-time scan
/// over a large range therefore executes entirely on the caller's context;
/// batch the walk or bound it with `limit` if that context must stay
/// responsive.
pub struct Cursor {
    iter: Option<Box<dyn EngineIterator>>,
    options: IterOptions,
    walked: u64,
    state: State,
    pending: Option<Error>,
}

impl Cursor {
    pub(crate) fn new(mut iter: Box<dyn EngineIterator>, options: IterOptions) -> Self {
        match (&options.start, options.reverse) {
            (Some(start), false) => iter.seek(start),
            (Some(start), true) => {
                // A reverse walk starts at the last element at-or-before
                // the bound; seek() lands at-or-after it.
                iter.seek(start);
                if !iter.valid() {
                    iter.seek_to_last();
                } else if iter.key() > start.as_slice() {
                    iter.prev();
                }
            }
            (None, false) => iter.seek_to_first(),
            (None, true) => iter.seek_to_last(),
        }
        Self {
            iter: Some(iter),
            options,
            walked: 0,
            state: State::Positioned,
            pending: None,
        }
    }

    /// Delivers the entry at the current position and advances, or signals
    /// end-of-sequence with `Ok(None)`.
    ///
    /// An iteration error reported by the engine is delivered lazily, on
    /// the step after the one that encountered it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the session was disposed, or the
    /// pending engine error of the iteration.
    pub fn step(&mut self) -> GatewayResult<Option<Entry>> {
        if self.state == State::Disposed {
            return Err(Error::validation("cursor used after dispose"));
        }
        if let Some(error) = self.pending.take() {
            return Err(error);
        }
        if self.state == State::Exhausted {
            return Ok(None);
        }
        let Some(iter) = self.iter.as_mut() else {
            return Err(Error::validation("cursor has no iterator"));
        };

        if let Some(limit) = self.options.limit {
            if self.walked >= limit {
                self.state = State::Exhausted;
                return Ok(None);
            }
        }
        if !iter.valid() || !within_end(&self.options, iter.key()) {
            self.state = State::Exhausted;
            return Ok(None);
        }

        let entry = Entry {
            key: self
                .options
                .keys
                .then(|| self.options.key_encoding.decode(iter.key().to_vec())),
            value: self
                .options
                .values
                .then(|| self.options.value_encoding.decode(iter.value().to_vec())),
        };
        self.walked += 1;

        if self.options.reverse {
            iter.prev();
        } else {
            iter.next();
        }
        if let Err(error) = iter.status() {
            self.pending = Some(error.into());
        }

        Ok(Some(entry))
    }

    /// Releases the iterator immediately. Safe to call repeatedly, and
    /// accepted on a session that is carrying an iteration error.
    pub fn dispose(&mut self) {
        self.iter = None;
        self.state = State::Disposed;
    }

    /// Whether the session was disposed.
    pub fn is_disposed(&self) -> bool {
        self.state == State::Disposed
    }

    /// Number of payload-bearing steps delivered so far.
    pub fn steps_taken(&self) -> u64 {
        self.walked
    }
}

fn within_end(options: &IterOptions, key: &[u8]) -> bool {
    match &options.end {
        None => true,
        // The end bound is inclusive in either direction.
        Some(end) => {
            if options.reverse {
                key >= end.as_slice()
            } else {
                key <= end.as_slice()
            }
        }
    }
}
