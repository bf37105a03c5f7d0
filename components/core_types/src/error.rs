//! JavaScript error types and error handling.
//!
//! This module provides the JavaScript error kinds the promise runtime
//! raises or aggregates.

use crate::Value;
use thiserror::Error;

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Generic Error
    Error,
    /// Type error (e.g., chaining a promise to itself)
    TypeError,
    /// Several errors combined (`Promise.any` with no fulfilled input)
    AggregateError,
}

impl ErrorKind {
    /// The constructor name, as it appears in `String(error)`.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::AggregateError => "AggregateError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A JavaScript error with a kind and message.
///
/// This struct represents a JavaScript exception that can be thrown and caught.
/// An `AggregateError` additionally carries the reasons it aggregates.
///
/// # Examples
///
/// ```
/// use core_types::{JsError, ErrorKind};
///
/// let error = JsError::new(ErrorKind::TypeError, "Chaining cycle detected for promise");
///
/// assert_eq!(error.message, "Chaining cycle detected for promise");
/// assert_eq!(error.to_string(), "TypeError: Chaining cycle detected for promise");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Aggregated reasons, in input order (only set for `AggregateError`)
    pub errors: Vec<Value>,
}

impl JsError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Shorthand for a plain `Error`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Error, message)
    }

    /// Shorthand for a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Builds an `AggregateError` wrapping `errors`.
    pub fn aggregate(message: impl Into<String>, errors: Vec<Value>) -> Self {
        Self {
            errors,
            ..Self::new(ErrorKind::AggregateError, message)
        }
    }
}
