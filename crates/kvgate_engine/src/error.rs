//! Error types for engine operations.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Outcome codes reported by a storage engine.
///
/// These are the engine-level failures the gateway maps into its closed
/// status taxonomy. Anything an engine cannot express with the specific
/// variants travels as [`EngineError::InvalidArgument`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested key does not exist.
    #[error("key not found")]
    NotFound,

    /// Stored data failed an integrity check.
    #[error("corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The engine rejected the request.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of why the request was rejected.
        message: String,
    },
}

impl EngineError {
    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
