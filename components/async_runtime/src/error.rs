//! Errors raised by the event loop itself.

use core_types::Value;
use thiserror::Error;

/// A failure of the host loop, as opposed to a promise rejection.
///
/// Rejections never surface here; they travel through promise chains and
/// the rejection tracker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A host task or microtask threw and the loop is configured to abort.
    #[error("uncaught exception in {origin}: {value}")]
    Uncaught {
        /// Label of the job that threw
        origin: &'static str,
        /// The thrown value
        value: Value,
    },

    /// A checkpoint ran more microtasks than the configured limit.
    #[error("microtask checkpoint exceeded {limit} jobs")]
    MicrotaskLimitExceeded {
        /// The configured limit
        limit: usize,
    },
}

/// Result type for event loop operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
