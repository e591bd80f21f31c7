//! Validation and accumulation of atomic write batches.

use crate::error::{Error, GatewayResult};
use kvgate_engine::WriteBatch;

/// One caller-requested batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Store `value` under `key`.
    Put {
        /// The key to store under.
        key: Vec<u8>,
        /// The value to store.
        value: Vec<u8>,
    },
    /// Remove `key`.
    Del {
        /// The key to remove.
        key: Vec<u8>,
    },
}

impl BatchOp {
    /// Builds a put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Builds a delete operation.
    pub fn del(key: impl Into<Vec<u8>>) -> Self {
        Self::Del { key: key.into() }
    }
}

/// Accumulates validated operations into one atomic write.
///
/// Validation is all-or-nothing: every operation is checked before anything
/// reaches the engine, and a single invalid operation rejects the whole
/// batch. The builder is owned by exactly one caller and never appended to
/// concurrently. An empty batch is a successful no-op.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    batch: WriteBatch,
}

impl BatchBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a put operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty key.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> GatewayResult<()> {
        let key = key.into();
        validate_key(&key, "put")?;
        self.batch.put(key, value.into());
        Ok(())
    }

    /// Appends a delete operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty key.
    pub fn del(&mut self, key: impl Into<Vec<u8>>) -> GatewayResult<()> {
        let key = key.into();
        validate_key(&key, "del")?;
        self.batch.delete(key);
        Ok(())
    }

    /// Number of accumulated operations.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Whether no operations were accumulated.
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Validates `ops` in order and accumulates them as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first invalid operation; in
    /// that case nothing will be applied.
    pub fn build(ops: Vec<BatchOp>) -> GatewayResult<WriteBatch> {
        let mut builder = Self::new();
        for (index, op) in ops.into_iter().enumerate() {
            match op {
                BatchOp::Put { key, value } => builder.put(key, value),
                BatchOp::Del { key } => builder.del(key),
            }
            .map_err(|error| {
                Error::validation(format!("batch operation {index} is invalid: {error}"))
            })?;
        }
        Ok(builder.finish())
    }

    /// Consumes the builder, yielding the engine-level batch.
    #[must_use]
    pub fn finish(self) -> WriteBatch {
        self.batch
    }
}

fn validate_key(key: &[u8], op: &str) -> GatewayResult<()> {
    if key.is_empty() {
        return Err(Error::validation(format!(
            "`key` is required for `{op}` operation"
        )));
    }
    Ok(())
}
