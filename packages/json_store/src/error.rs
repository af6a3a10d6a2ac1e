//! Error types for the document engine.

use std::io;

use crate::Path;

/// Errors raised while operating on the mounted document.
///
/// Every operation validates its inputs before touching the tree, so an
/// error always means the document is unchanged.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A path named a missing key, a bad array index, or tried to descend
    /// through a scalar.
    #[error("no such entry: {path}")]
    NotFound { path: Path },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The host refused access to the backing file.
    #[error("permission denied: {path}")]
    PermissionDenied { path: Path },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: &'static str },

    #[error("backing store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn not_found(path: &Path) -> Self {
        Error::NotFound { path: path.clone() }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn not_found_display() {
        let e = Error::not_found(&Path::parse("b/7"));
        assert_eq!(e.to_string(), "no such entry: /b/7");
    }

    #[test]
    fn invalid_argument_display() {
        let e = Error::invalid("bad type");
        assert!(e.to_string().contains("invalid argument"));
        assert!(e.to_string().contains("bad type"));
    }

    #[test]
    fn not_supported_display() {
        let e = Error::NotSupported { operation: "symlink" };
        assert_eq!(e.to_string(), "operation not supported: symlink");
    }

    #[test]
    fn io_error_conversion_keeps_source() {
        let e: Error = io::Error::from(io::ErrorKind::NotFound).into();
        assert!(matches!(e, Error::Io(_)));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: Error = parse.into();
        assert!(e.to_string().starts_with("JSON error"));
    }
}
