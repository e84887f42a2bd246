//! Runtime error types
//!
//! Every builtin signals failure through [`RError`]. The variant is the
//! error *kind* (what went wrong), the payload is the formatted message
//! that a user sees after `Error in ...:`.

use std::fmt;

use thiserror::Error;

/// Kind tag carried by every error condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No specialization accepts the argument types.
    Type,
    /// Right type, invalid value.
    Value,
    /// A coercion could not represent the source value.
    Conversion,
    /// A collaborator (connection, loader) failed.
    Io,
    /// Internal invariant violation (e.g. guard mismatch).
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Type => "TypeError",
            ErrorKind::Value => "ValueError",
            ErrorKind::Conversion => "ConversionFailure",
            ErrorKind::Io => "IOFailure",
            ErrorKind::Internal => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime error type
#[derive(Debug, Error)]
pub enum RError {
    /// Operand type not supported (e.g. `abs` on a raw vector)
    #[error("{0}")]
    Type(String),

    /// Argument has the right type but an invalid value
    #[error("{0}")]
    Value(String),

    /// Unparsable or unrepresentable source value
    #[error("cannot coerce {value} to {target}")]
    Conversion {
        /// Offending source value, already formatted
        value: String,
        /// Target type name
        target: &'static str,
    },

    /// Collaborator I/O failed; the message of the source is kept
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Invariant violation inside the runtime
    #[error("internal error: {0}")]
    Internal(String),
}

impl RError {
    /// Create a type error
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        RError::Type(msg.into())
    }

    /// Create a value error
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        RError::Value(msg.into())
    }

    /// Create a conversion failure
    pub fn conversion<S: Into<String>>(value: S, target: &'static str) -> Self {
        RError::Conversion {
            value: value.into(),
            target,
        }
    }

    /// Wrap an I/O error with a short description of the operation
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        RError::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an I/O failure that did not come from the OS
    pub fn io_message<S: Into<String>>(msg: S) -> Self {
        let msg = msg.into();
        RError::Io {
            context: msg.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, msg),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        RError::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RError::Type(_) => ErrorKind::Type,
            RError::Value(_) => ErrorKind::Value,
            RError::Conversion { .. } => ErrorKind::Conversion,
            RError::Io { .. } => ErrorKind::Io,
            RError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message without the I/O context duplication.
    pub fn message(&self) -> String {
        match self {
            RError::Io { context, source } if source.to_string() == *context => context.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for runtime operations
pub type RResult<T> = Result<T, RError>;
