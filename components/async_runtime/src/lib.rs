//! Async runtime for JavaScript execution.
//!
//! This crate provides the deferred-value machinery of a JavaScript engine:
//! - Promise implementation following the Promise/A+ specification
//! - Event loop with task and microtask queues and virtual-clock timers
//! - Unhandled-rejection tracking
//!
//! # Overview
//!
//! - [`Promise`] - Promise/A+ compliant implementation
//! - [`Scheduler`] - The seam promises schedule their jobs through
//! - [`EventLoop`] - Host event loop; the usual [`Scheduler`]
//! - [`RejectionTracker`] - Reports rejections nobody handled
//! - [`RuntimeConfig`] - Event loop settings
//!
//! # Examples
//!
//! ## Promise Usage
//!
//! ```
//! use async_runtime::{EventLoop, Function, PromiseState};
//! use core_types::Value;
//!
//! let event_loop = EventLoop::new();
//! let promise = event_loop
//!     .reject(Value::from("x"))
//!     .then(Some(Function::new(|_| Ok(Value::from("unused")))), None)
//!     .catch(Function::new(|reason| Ok(reason)));
//!
//! event_loop.run_until_done().unwrap();
//! assert_eq!(promise.state(), PromiseState::Fulfilled);
//! assert_eq!(promise.result(), Some(Value::from("x")));
//! ```
//!
//! ## Deterministic Scheduling
//!
//! Any [`Scheduler`] can drive promises. A bare [`MicrotaskQueue`] is enough
//! for tests that want to step jobs one at a time.
//!
//! ```
//! use async_runtime::{MicrotaskQueue, Promise, SchedulerRef};
//! use core_types::Value;
//! use std::rc::Rc;
//!
//! let queue = MicrotaskQueue::new();
//! let scheduler: SchedulerRef = Rc::new(queue.clone());
//! let chained = Promise::resolve(&scheduler, Value::Smi(1)).then(None, None);
//!
//! assert_eq!(queue.len(), 1);
//! queue.dequeue().unwrap().run().unwrap();
//! assert_eq!(chained.result(), Some(Value::Smi(1)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combinators;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod promise;
pub mod rejection;
pub mod task_queue;

// Re-export main types at crate root
pub use config::RuntimeConfig;
pub use error::{RuntimeError, RuntimeResult};
pub use event_loop::{EventLoop, TimerId};
pub use promise::{Function, Promise, PromiseId, PromiseState, ResolvingFunctions, SchedulerRef};
pub use rejection::{RejectionEvent, RejectionOperation, RejectionTracker};
pub use task_queue::{MicroTask, MicrotaskQueue, Scheduler, Task, TaskQueue};
