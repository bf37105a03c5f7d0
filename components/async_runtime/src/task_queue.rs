//! Task and microtask queue management.
//!
//! This module provides the task and microtask queues used by the event loop,
//! plus the [`Scheduler`] seam through which promises hand off their jobs.
//! Tasks are executed one at a time, with all microtasks draining after each task.

use crate::promise::Promise;
use crate::rejection::RejectionOperation;
use core_types::JsResult;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// The host facility promises use to defer work out of the current call stack.
///
/// `schedule` must not run the job before returning; the job has to wait
/// until the caller's synchronous code has unwound. Jobs scheduled on the
/// same scheduler run in FIFO order.
pub trait Scheduler {
    /// Enqueues a job on the microtask queue.
    fn schedule(&self, job: MicroTask);

    /// Notified when a promise is rejected without any handler attached
    /// ([`RejectionOperation::Reject`]), and when a handler is first attached
    /// to such a promise afterwards ([`RejectionOperation::Handle`]).
    ///
    /// The default implementation ignores both.
    fn track_rejection(&self, _promise: &Promise, _operation: RejectionOperation) {}
}

/// A task to be executed by the event loop.
///
/// Tasks represent coarse-grained work such as timer callbacks or I/O
/// completions. An `Err` return is an uncaught exception.
pub struct Task {
    callback: Box<dyn FnOnce() -> JsResult<()>>,
}

impl Task {
    /// Creates a new Task from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> JsResult<()> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    pub fn run(self) -> JsResult<()> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// A microtask to be executed by the event loop.
///
/// Microtasks are executed after each task, before any further task runs.
/// Promise reactions are microtasks.
pub struct MicroTask {
    name: &'static str,
    callback: Box<dyn FnOnce() -> JsResult<()>>,
}

impl MicroTask {
    /// Creates a new MicroTask from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> JsResult<()> + 'static,
    {
        Self::named("microtask", f)
    }

    /// Creates a MicroTask with a label that shows up in logs.
    pub fn named<F>(name: &'static str, f: F) -> Self
    where
        F: FnOnce() -> JsResult<()> + 'static,
    {
        Self {
            name,
            callback: Box::new(f),
        }
    }

    /// The label given at construction.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Executes the microtask.
    pub fn run(self) -> JsResult<()> {
        (self.callback)()
    }
}

impl std::fmt::Debug for MicroTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MicroTask {{ name: {:?} }}", self.name)
    }
}

/// A queue for tasks.
///
/// Cloning yields another handle onto the same queue, so callbacks can
/// enqueue follow-up work while the queue is being processed.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task to the end of the queue.
    pub fn enqueue(&self, task: Task) {
        self.queue.borrow_mut().push_back(task);
    }

    /// Removes and returns the next task from the queue.
    pub fn dequeue(&self) -> Option<Task> {
        self.queue.borrow_mut().pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
}

/// A queue for microtasks.
///
/// Like [`TaskQueue`], clones share the underlying queue. The queue is also
/// a [`Scheduler`] on its own, which makes it a deterministic stand-in for an
/// event loop: schedule through it, then drain it by hand.
#[derive(Debug, Clone, Default)]
pub struct MicrotaskQueue {
    queue: Rc<RefCell<VecDeque<MicroTask>>>,
}

impl MicrotaskQueue {
    /// Creates a new empty MicrotaskQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a microtask to the end of the queue.
    pub fn enqueue(&self, microtask: MicroTask) {
        self.queue.borrow_mut().push_back(microtask);
    }

    /// Removes and returns the next microtask from the queue.
    pub fn dequeue(&self) -> Option<MicroTask> {
        self.queue.borrow_mut().pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Returns the number of microtasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl Scheduler for MicrotaskQueue {
    fn schedule(&self, job: MicroTask) {
        self.enqueue(job);
    }
}
