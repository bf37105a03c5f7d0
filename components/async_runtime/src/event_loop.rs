//! Event loop implementation.
//!
//! This module provides the host side of the promise runtime: the loop that
//! owns the microtask queue promises schedule onto, the task queue, timers
//! on a virtual clock, and the unhandled-rejection channel.

use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::promise::{Promise, PromiseId, ResolvingFunctions, SchedulerRef};
use crate::rejection::{RejectionEvent, RejectionOperation, RejectionTracker};
use crate::task_queue::{MicroTask, MicrotaskQueue, Scheduler, Task, TaskQueue};
use core_types::{JsResult, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

/// Handle returned by [`EventLoop::set_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Timers keyed by `(due time, id)`; ids grow monotonically, so timers due
/// at the same instant fire in creation order.
#[derive(Default)]
struct TimerQueue {
    now: u64,
    next_id: u64,
    pending: BTreeMap<(u64, u64), Task>,
}

impl TimerQueue {
    fn insert(&mut self, delay_ms: u64, task: Task) -> TimerId {
        self.next_id += 1;
        let due = self.now.saturating_add(delay_ms);
        self.pending.insert((due, self.next_id), task);
        TimerId(self.next_id)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|&(_, timer), _| timer != id.0);
        self.pending.len() != before
    }

    fn take_due(&mut self) -> Vec<Task> {
        let later = self.pending.split_off(&(self.now.saturating_add(1), 0));
        std::mem::replace(&mut self.pending, later)
            .into_values()
            .collect()
    }

    fn advance_to_next(&mut self) -> bool {
        match self.pending.keys().next() {
            Some(&(due, _)) => {
                self.now = self.now.max(due);
                true
            }
            None => false,
        }
    }
}

struct EventLoopInner {
    config: RuntimeConfig,
    task_queue: TaskQueue,
    microtask_queue: MicrotaskQueue,
    timers: RefCell<TimerQueue>,
    rejections: RejectionTracker,
    uncaught: RefCell<Vec<Value>>,
}

impl Scheduler for EventLoopInner {
    fn schedule(&self, job: MicroTask) {
        trace!(job = job.name(), "microtask scheduled");
        self.microtask_queue.enqueue(job);
    }

    fn track_rejection(&self, promise: &Promise, operation: RejectionOperation) {
        self.rejections.track(promise, operation);
    }
}

/// The JavaScript event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Moves timers that are due into the task queue
/// 2. Takes the oldest task from the task queue and executes it
/// 3. Drains all microtasks, including those queued while draining
/// 4. Reports rejections that stayed unhandled through that drain
///
/// Code running before [`run_until_done`](Self::run_until_done) counts as the
/// current task, so its microtasks drain before the first task or timer.
/// `EventLoop` is a cheap handle; clones drive the same loop, which is how
/// callbacks schedule further work.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Function};
/// use core_types::Value;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let event_loop = EventLoop::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let l = log.clone();
/// event_loop.set_timeout(0, move || {
///     l.borrow_mut().push("B");
///     Ok(())
/// });
///
/// let l = log.clone();
/// event_loop.resolve(Value::Undefined).then(
///     Some(Function::new(move |_| {
///         l.borrow_mut().push("A");
///         Ok(Value::Undefined)
///     })),
///     None,
/// );
///
/// log.borrow_mut().push("C");
/// event_loop.run_until_done().unwrap();
/// assert_eq!(*log.borrow(), vec!["C", "A", "B"]);
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<EventLoopInner>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues and default settings.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a new EventLoop with the given settings.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let rejections = RejectionTracker::new(config.report_unhandled_rejections);
        Self {
            inner: Rc::new(EventLoopInner {
                config,
                task_queue: TaskQueue::new(),
                microtask_queue: MicrotaskQueue::new(),
                timers: RefCell::new(TimerQueue::default()),
                rejections,
                uncaught: RefCell::new(Vec::new()),
            }),
        }
    }

    /// The settings this loop was created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// The scheduler promises created for this loop enqueue onto.
    pub fn scheduler(&self) -> SchedulerRef {
        self.inner.clone()
    }

    /// Creates a promise bound to this loop; see [`Promise::new`].
    pub fn new_promise<F>(&self, executor: F) -> Promise
    where
        F: FnOnce(&ResolvingFunctions) -> JsResult<()>,
    {
        Promise::new(&self.scheduler(), executor)
    }

    /// See [`Promise::resolve`].
    pub fn resolve(&self, value: impl Into<Value>) -> Promise {
        Promise::resolve(&self.scheduler(), value.into())
    }

    /// See [`Promise::reject`].
    pub fn reject(&self, reason: impl Into<Value>) -> Promise {
        Promise::reject(&self.scheduler(), reason.into())
    }

    /// See [`Promise::with_resolvers`].
    pub fn with_resolvers(&self) -> (Promise, ResolvingFunctions) {
        Promise::with_resolvers(&self.scheduler())
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.inner.task_queue.enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.inner.schedule(microtask);
    }

    /// Queues a host callback as a microtask.
    pub fn queue_microtask<F>(&self, f: F)
    where
        F: FnOnce() -> JsResult<()> + 'static,
    {
        self.enqueue_microtask(MicroTask::named("queueMicrotask", f));
    }

    /// Runs `f` as a task once `delay_ms` virtual milliseconds have passed.
    pub fn set_timeout<F>(&self, delay_ms: u64, f: F) -> TimerId
    where
        F: FnOnce() -> JsResult<()> + 'static,
    {
        let id = self.inner.timers.borrow_mut().insert(delay_ms, Task::new(f));
        trace!(timer = id.0, delay_ms, "timer set");
        id
    }

    /// Cancels a timer. Returns false if it already fired or never existed.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.inner.timers.borrow_mut().cancel(id)
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.inner.timers.borrow().now
    }

    /// Number of timers that have not fired yet.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().pending.len()
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.inner.task_queue.is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.inner.microtask_queue.is_empty()
    }

    /// Runs the event loop until no task, microtask or timer remains.
    ///
    /// Starts with a microtask checkpoint for the code that ran before the
    /// call. When only timers remain, the virtual clock jumps to the next
    /// one.
    pub fn run_until_done(&self) -> RuntimeResult<()> {
        self.run_all_microtasks()?;
        loop {
            self.promote_due_timers();
            if let Some(task) = self.inner.task_queue.dequeue() {
                self.run_task(task)?;
                self.run_all_microtasks()?;
                continue;
            }
            if !self.inner.timers.borrow_mut().advance_to_next() {
                break;
            }
        }
        Ok(())
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// New microtasks added during execution are also processed before this
    /// method returns. Afterwards, rejections that are still unhandled are
    /// reported.
    pub fn run_all_microtasks(&self) -> RuntimeResult<()> {
        let mut ran = 0usize;
        while let Some(microtask) = self.inner.microtask_queue.dequeue() {
            ran += 1;
            if let Some(limit) = self.inner.config.microtask_limit {
                if ran > limit {
                    warn!(limit, "microtask limit exceeded");
                    self.inner.rejections.notify();
                    return Err(RuntimeError::MicrotaskLimitExceeded { limit });
                }
            }
            let origin = microtask.name();
            if let Err(thrown) = microtask.run() {
                if let Err(error) = self.report_uncaught(origin, thrown) {
                    self.inner.rejections.notify();
                    return Err(error);
                }
            }
        }
        if ran > 0 {
            trace!(ran, "microtask checkpoint");
        }
        self.inner.rejections.notify();
        Ok(())
    }

    /// Runs all queued tasks without draining microtasks between them.
    ///
    /// This is primarily for testing purposes.
    pub fn run_all_tasks(&self) -> RuntimeResult<()> {
        while let Some(task) = self.inner.task_queue.dequeue() {
            self.run_task(task)?;
        }
        Ok(())
    }

    /// Processes one complete cycle: one task (or due timer) followed by all
    /// microtasks. Does not advance the clock.
    pub fn process_one_cycle(&self) -> RuntimeResult<()> {
        self.promote_due_timers();
        if let Some(task) = self.inner.task_queue.dequeue() {
            self.run_task(task)?;
        }
        self.run_all_microtasks()
    }

    /// Installs a callback that sees every rejection event as it happens.
    pub fn on_rejection_event(&self, hook: impl Fn(&RejectionEvent) + 'static) {
        self.inner.rejections.set_hook(hook);
    }

    /// Rejection events emitted so far.
    pub fn rejection_events(&self) -> Vec<RejectionEvent> {
        self.inner.rejections.events()
    }

    /// Removes and returns the rejection events emitted so far.
    pub fn take_rejection_events(&self) -> Vec<RejectionEvent> {
        self.inner.rejections.take_events()
    }

    /// Reasons of rejections reported unhandled and not handled since, in
    /// report order.
    pub fn unhandled_rejections(&self) -> Vec<Value> {
        let events = self.rejection_events();
        let handled: HashSet<PromiseId> = events
            .iter()
            .filter_map(|event| match event {
                RejectionEvent::Handled { promise } => Some(*promise),
                RejectionEvent::Unhandled { .. } => None,
            })
            .collect();
        events
            .into_iter()
            .filter_map(|event| match event {
                RejectionEvent::Unhandled { promise, reason } if !handled.contains(&promise) => {
                    Some(reason)
                }
                _ => None,
            })
            .collect()
    }

    /// Exceptions thrown by host tasks or microtasks that were skipped.
    pub fn uncaught_errors(&self) -> Vec<Value> {
        self.inner.uncaught.borrow().clone()
    }

    fn run_task(&self, task: Task) -> RuntimeResult<()> {
        match task.run() {
            Ok(()) => Ok(()),
            Err(thrown) => self.report_uncaught("task", thrown),
        }
    }

    fn report_uncaught(&self, origin: &'static str, thrown: Value) -> RuntimeResult<()> {
        warn!(origin, %thrown, "uncaught exception");
        if self.inner.config.abort_on_uncaught {
            return Err(RuntimeError::Uncaught {
                origin,
                value: thrown,
            });
        }
        self.inner.uncaught.borrow_mut().push(thrown);
        Ok(())
    }

    fn promote_due_timers(&self) {
        let due = self.inner.timers.borrow_mut().take_due();
        for task in due {
            self.inner.task_queue.enqueue(task);
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("now", &self.now())
            .field("tasks", &self.inner.task_queue.len())
            .field("microtasks", &self.inner.microtask_queue.len())
            .field("timers", &self.pending_timers())
            .field("rejections", &self.inner.rejections)
            .finish()
    }
}
