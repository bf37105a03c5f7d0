//! Core JavaScript value types and error handling.
//!
//! This crate provides the vocabulary shared by the promise runtime:
//! value representation, error types and the thenable capability that
//! resolution dispatches on.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`JsError`] - JavaScript errors
//! - [`ErrorKind`] - Types of JavaScript errors
//! - [`Thenable`] - Anything a promise can adopt
//! - [`JsResult`] - Result whose error side is a thrown value
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, JsResult, Value};
//!
//! fn checked_div(a: i32, b: i32) -> JsResult<Value> {
//!     if b == 0 {
//!         return Err(JsError::new(ErrorKind::Error, "division by zero").into());
//!     }
//!     Ok(Value::Smi(a / b))
//! }
//!
//! assert_eq!(checked_div(6, 3), Ok(Value::Smi(2)));
//! assert!(checked_div(1, 0).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod thenable;
mod value;

pub use error::{ErrorKind, JsError};
pub use thenable::{Reaction, Thenable};
pub use value::Value;

/// Result of an operation that may throw.
///
/// JavaScript can throw any value, so the error side is a [`Value`]
/// rather than a Rust error type. `JsError` converts into it, so `?` works
/// on `Result<_, JsError>` inside functions returning `JsResult`.
pub type JsResult<T> = Result<T, Value>;
