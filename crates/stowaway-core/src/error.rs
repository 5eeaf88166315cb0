//! Stowaway error types

use thiserror::Error;

/// The main error type for Stowaway operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading or writing a container
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad argument or rejected path (e.g. parent traversal in a scope)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing source on build, or missing file on read/open
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed trailer or corrupt archive region
    #[error("Invalid container format: {0}")]
    Format(String),

    /// Unsupported operation (e.g. listing a directory)
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Content could not be decoded as text
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type alias for Stowaway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used by callers that translate
/// errors into another vocabulary (HTTP status codes, exit codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Validation,
    NotFound,
    Format,
    Unsupported,
    Encoding,
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Error::Encoding(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Format(_) => ErrorKind::Format,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Encoding(_) => ErrorKind::Encoding,
        }
    }

    /// True if this is a [`Error::NotFound`]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Wrap an I/O error raised while touching `path`, promoting a missing
    /// file to [`Error::NotFound`].
    pub fn from_io_at(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.display().to_string())
        } else {
            Error::Io(err)
        }
    }
}
