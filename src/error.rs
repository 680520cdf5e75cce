//! Error types for futures and the engine around them.
//!
//! The taxonomy is small:
//!
//! - **Cancelled**: a future was cancelled, observed through a path that
//!   reports errors (blocking await, sequencing, operations)
//! - **Timeout**: a deadline elapsed before the source settled
//! - **User**: an opaque application error, passed through unmodified
//!
//! User errors are never inspected beyond this classification. The original
//! error value is kept as the [`std::error::Error::source`] of the wrapper and
//! can be recovered with [`Error::downcast_ref`].

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The future was cancelled.
    Cancelled,
    /// A deadline elapsed before the future settled.
    Timeout,
    /// Application-supplied error.
    User,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::Timeout => write!(f, "timed out"),
            Self::User => write!(f, "user error"),
        }
    }
}

/// The error type carried by failed futures.
///
/// Cheap to clone: a source error is shared behind an `Arc`, so every
/// listener observing the same failure sees the same underlying value.
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// Creates a timeout error for the given bound.
    #[must_use]
    pub fn timeout(after: Duration) -> Self {
        Self::new(ErrorKind::Timeout).with_message(format!("no result after {after:?}"))
    }

    /// Creates a user error from a message.
    #[must_use]
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::User).with_message(message)
    }

    /// Wraps an application error without altering it.
    #[must_use]
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::new(ErrorKind::User).with_source(source)
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if this error represents cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Returns true if this error is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Returns true if this error came from application code.
    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self.kind, ErrorKind::User)
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the wrapped application error if it has type `E`.
    #[must_use]
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|s| s.downcast_ref::<E>())
    }

    /// Returns true if both errors share the same source allocation.
    ///
    /// Used to check that an error was passed through a chain untouched.
    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        match (&self.source, &other.source) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("source", &self.source.as_ref().map(|s| s.to_string()))
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl PartialEq for Error {
    /// Errors compare equal when kind and message match and the sources are
    /// either both absent or the same allocation.
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && match (&self.source, &other.source) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl Eq for Error {}

/// A specialized Result type for future outcomes.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while reading pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Expected shape of the value.
        expected: &'static str,
        /// The raw value found.
        value: String,
    },
    /// A configuration file could not be read.
    #[error("failed to read config file {path}: {reason}")]
    Read {
        /// File path.
        path: String,
        /// I/O failure description.
        reason: String,
    },
    /// A configuration file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),
}
