//! Error types for the gateway.

use crate::status::Status;
use kvgate_engine::EngineError;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, Error>;

/// Errors reported by the gateway.
///
/// The taxonomy is deliberately small and maps to where each failure is
/// detected:
///
/// - [`Error::Validation`] and [`Error::Resource`] are raised synchronously,
///   before any job reaches the worker pool.
/// - [`Error::Handle`] is raised synchronously by the lifecycle guard.
/// - [`Error::Engine`] is always delivered asynchronously through a job's
///   completion ticket, never thrown at the call site.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing caller arguments.
    #[error("validation error: {message}")]
    Validation {
        /// What was malformed.
        message: String,
    },

    /// An engine-reported failure, classified by [`Status`].
    #[error("{status}: {message}")]
    Engine {
        /// The mapped outcome kind.
        status: Status,
        /// The engine's own rendering of the failure.
        message: String,
    },

    /// A resource could not be allocated during option resolution.
    #[error("resource error: {message}")]
    Resource {
        /// What failed to allocate.
        message: String,
    },

    /// The handle's lifecycle state does not permit the operation.
    #[error("handle error: {message}")]
    Handle {
        /// Why the operation was rejected.
        message: String,
    },
}

impl Error {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a resource error.
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource {
            message: message.into(),
        }
    }

    /// Creates a handle-lifecycle error.
    pub fn handle(message: impl Into<String>) -> Self {
        Self::Handle {
            message: message.into(),
        }
    }

    /// The status kind carried by an engine error, if this is one.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Engine { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is an engine error with [`Status::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Engine {
                status: Status::NotFound,
                ..
            }
        )
    }
}

impl From<EngineError> for Error {
    fn from(error: EngineError) -> Self {
        Error::Engine {
            status: Status::from_engine(&error),
            message: error.to_string(),
        }
    }
}
