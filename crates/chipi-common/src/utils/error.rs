//! Error types for Chipi.
//!
//! Every fallible operation in the workspace returns [`Result`], and every
//! failure is reported to the immediate caller. Nothing is retried and no
//! placeholder value is ever substituted for a missing one.

use thiserror::Error;

/// Result type alias used throughout Chipi.
pub type Result<T> = std::result::Result<T, Error>;

/// The Chipi error taxonomy.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid construction or configuration parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A buffer was asked for its current value while empty.
    #[error("buffer '{label}' is empty")]
    EmptyBuffer {
        /// Label of the buffer.
        label: String,
    },

    /// A buffer was asked for its previous value with fewer than two elements.
    #[error("buffer '{label}' has {len} value(s), at least 2 are required")]
    InsufficientHistory {
        /// Label of the buffer.
        label: String,
        /// Number of values currently held.
        len: usize,
    },

    /// A label appeared more than once in a manager's label set.
    #[error("duplicate buffer label: {0}")]
    DuplicateLabel(String),

    /// No buffer is registered under the label.
    #[error("unknown buffer label: {0}")]
    UnknownLabel(String),

    /// The requested interchange format is not supported.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A codec could not parse its payload.
    #[error("malformed {format} payload: {reason}")]
    MalformedPayload {
        /// Name of the format being decoded.
        format: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// No derived accessor is registered under the name.
    #[error("unknown derived accessor: {0}")]
    UnknownAccessor(String),

    /// A value had the wrong variant for the operation.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type name.
        expected: String,
        /// Found type name.
        found: String,
    },

    /// A positional index was outside the buffer.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Buffer length.
        len: usize,
    },

    /// A helper was called with an argument it cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Integer arithmetic overflowed.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// I/O error from a file adapter.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a [`Error::MalformedPayload`] for the given format name.
    pub fn malformed(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`Error::TypeMismatch`].
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Returns true for the accessor-precondition kinds
    /// ([`Error::EmptyBuffer`] and [`Error::InsufficientHistory`]).
    ///
    /// Callers typically treat these as "no value yet".
    #[must_use]
    pub fn is_recoverable_precondition(&self) -> bool {
        matches!(
            self,
            Self::EmptyBuffer { .. } | Self::InsufficientHistory { .. }
        )
    }
}
