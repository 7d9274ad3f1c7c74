//! Script error types.
//!
//! This module provides the error type that flows through the rejection path
//! of a deferred computation. Errors here are ordinary values: a failing
//! handler or initializer produces a `ScriptError`, which is then carried as
//! the rejection reason.

use crate::value::Value;
use std::fmt;

/// The kind of script error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A value was used in a way its type does not support
    TypeError,
    /// Value out of allowed range
    RangeError,
    /// Several underlying failures reported as one
    AggregateError,
    /// Internal runtime error
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::AggregateError => "AggregateError",
            ErrorKind::InternalError => "InternalError",
        };
        write!(f, "{name}")
    }
}

/// A script error with a message.
///
/// For [`ErrorKind::AggregateError`] the `errors` field carries the
/// individual underlying reasons; it is empty for every other kind.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, ScriptError};
///
/// let error = ScriptError::type_error("chaining cycle detected");
/// assert_eq!(error.kind, ErrorKind::TypeError);
/// assert_eq!(error.to_string(), "TypeError: chaining cycle detected");
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ScriptError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Underlying reasons, for aggregate errors only
    pub errors: Vec<Value>,
}

impl ScriptError {
    /// Creates a new error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Creates a new [`ErrorKind::TypeError`].
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Creates a new [`ErrorKind::AggregateError`] carrying the underlying
    /// reasons.
    pub fn aggregate(message: impl Into<String>, errors: Vec<Value>) -> Self {
        Self {
            kind: ErrorKind::AggregateError,
            message: message.into(),
            errors,
        }
    }
}
