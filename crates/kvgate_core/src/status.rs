//! Mapping from engine outcome codes to the closed status taxonomy.

use kvgate_engine::EngineError;
use std::fmt;

/// Rendered before every non-OK kind name.
const ERROR_PREFIX: &str = "engine error: ";

/// The closed set of engine outcome kinds the gateway reports.
///
/// Callers branch on the kind (via the predicates or pattern matching),
/// never on the rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The operation succeeded.
    Ok,
    /// The requested key does not exist.
    NotFound,
    /// The engine detected corrupted data.
    Corruption,
    /// An I/O error occurred inside the engine.
    IoError,
    /// Any engine outcome not covered by the other kinds.
    Unknown,
}

impl Status {
    /// Maps an engine outcome to its status kind.
    ///
    /// This mapping is total: every engine error lands on exactly one kind,
    /// with [`Status::Unknown`] as the catch-all.
    pub fn from_engine(error: &EngineError) -> Self {
        match error {
            EngineError::NotFound => Status::NotFound,
            EngineError::Corruption { .. } => Status::Corruption,
            EngineError::Io(_) => Status::IoError,
            EngineError::InvalidArgument { .. } => Status::Unknown,
        }
    }

    /// Whether this is [`Status::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }

    /// Whether this is [`Status::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Status::NotFound)
    }

    /// Whether this is [`Status::Corruption`].
    pub fn is_corruption(&self) -> bool {
        matches!(self, Status::Corruption)
    }

    /// Whether this is [`Status::IoError`].
    pub fn is_io_error(&self) -> bool {
        matches!(self, Status::IoError)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::NotFound => write!(f, "{ERROR_PREFIX}NotFound"),
            Status::Corruption => write!(f, "{ERROR_PREFIX}Corruption"),
            Status::IoError => write!(f, "{ERROR_PREFIX}IOError"),
            Status::Unknown => write!(f, "{ERROR_PREFIX}Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn mapping_is_total() {
        assert_eq!(Status::from_engine(&EngineError::NotFound), Status::NotFound);
        assert_eq!(
            Status::from_engine(&EngineError::corruption("bad block")),
            Status::Corruption
        );
        assert_eq!(
            Status::from_engine(&EngineError::Io(io::Error::new(
                io::ErrorKind::Other,
                "disk"
            ))),
            Status::IoError
        );
        assert_eq!(
            Status::from_engine(&EngineError::invalid_argument("nope")),
            Status::Unknown
        );
    }

    #[test]
    fn ok_renders_without_prefix() {
        assert_eq!(Status::Ok.to_string(), "OK");
    }

    #[test]
    fn errors_render_with_fixed_prefix() {
        assert_eq!(Status::NotFound.to_string(), "engine error: NotFound");
        assert_eq!(Status::Corruption.to_string(), "engine error: Corruption");
        assert_eq!(Status::IoError.to_string(), "engine error: IOError");
        assert_eq!(Status::Unknown.to_string(), "engine error: Unknown");
    }

    #[test]
    fn predicates() {
        assert!(Status::Ok.is_ok());
        assert!(Status::NotFound.is_not_found());
        assert!(Status::Corruption.is_corruption());
        assert!(Status::IoError.is_io_error());
        assert!(!Status::Unknown.is_ok());
    }
}
