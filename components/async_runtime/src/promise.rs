//! Promise implementation with Promise/A+ semantics.
//!
//! A [`Promise`] is a cheap handle onto shared state. Every clone observes the
//! same settlement. Continuations never run inside the call that registers
//! them: they are handed to the injected [`Scheduler`] as microtasks, one job
//! per reaction, in registration order.
//!
//! Adoption of thenables goes through [`Thenable::subscribe`], so foreign
//! promise types interoperate without reflection, and it happens in its own
//! scheduled job. A chain of promises resolving to promises therefore unwinds
//! one microtask at a time instead of recursing.

use crate::rejection::RejectionOperation;
use crate::task_queue::{MicroTask, Scheduler};
use core_types::{JsError, JsResult, Reaction, Thenable, Value};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Shared handle to the scheduler a promise enqueues its jobs on.
pub type SchedulerRef = Rc<dyn Scheduler>;

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

/// Process-unique identifier of a promise, used in logs and rejection events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromiseId(u64);

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

thread_local! {
    static NEXT_PROMISE_ID: Cell<u64> = const { Cell::new(1) };
}

fn next_promise_id() -> PromiseId {
    NEXT_PROMISE_ID.with(|next| {
        let id = next.get();
        next.set(id.wrapping_add(1));
        PromiseId(id)
    })
}

/// A handler passed to [`Promise::then`] or [`Promise::catch`].
///
/// The handler receives the fulfillment value (or rejection reason). Its
/// `Ok` return value resolves the derived promise; an `Err` is a throw and
/// rejects it.
pub struct Function {
    callback: Box<dyn FnOnce(Value) -> JsResult<Value>>,
}

impl Function {
    /// Creates a new Function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Value) -> JsResult<Value> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Calls the function with its single argument.
    pub fn call(self, argument: Value) -> JsResult<Value> {
        (self.callback)(argument)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ ... }}")
    }
}

/// The outcome handed to a reaction job.
#[derive(Debug, Clone)]
enum Settlement {
    Fulfilled(Value),
    Rejected(Value),
}

/// A reaction to be triggered when a Promise settles.
///
/// `downstream` is `None` for internal subscriptions (thenable adoption,
/// combinators) whose handlers only feed closures.
#[derive(Debug)]
struct PromiseReaction {
    on_fulfilled: Option<Function>,
    on_rejected: Option<Function>,
    downstream: Option<ResolvingFunctions>,
}

impl PromiseReaction {
    fn into_job(self, settlement: Settlement) -> MicroTask {
        MicroTask::named("PromiseReactionJob", move || {
            self.run(settlement);
            Ok(())
        })
    }

    fn run(self, settlement: Settlement) {
        let outcome = match settlement {
            Settlement::Fulfilled(value) => match self.on_fulfilled {
                Some(handler) => handler.call(value),
                None => Ok(value),
            },
            Settlement::Rejected(reason) => match self.on_rejected {
                Some(handler) => handler.call(reason),
                None => Err(reason),
            },
        };

        if let Some(downstream) = self.downstream {
            match outcome {
                Ok(value) => downstream.resolve(value),
                Err(reason) => downstream.reject(reason),
            }
        }
    }
}

struct PromiseInner {
    id: PromiseId,
    state: PromiseState,
    result: Option<Value>,
    reactions: Vec<PromiseReaction>,
    /// Set once any reaction has been attached; drives rejection tracking.
    handled: bool,
}

impl Drop for PromiseInner {
    /// Tears down chains of pending derived promises iteratively; each
    /// reaction owns the next link, so the default drop would recurse once
    /// per link.
    fn drop(&mut self) {
        let mut worklist = std::mem::take(&mut self.reactions);
        while let Some(reaction) = worklist.pop() {
            if let Some(downstream) = &reaction.downstream {
                let next = &downstream.promise.inner;
                if Rc::strong_count(next) == 1 {
                    if let Ok(mut next) = next.try_borrow_mut() {
                        worklist.append(&mut next.reactions);
                    }
                }
            }
        }
    }
}

/// A JavaScript Promise.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Function, PromiseState};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let promise = event_loop.new_promise(|resolvers| {
///     resolvers.resolve(Value::Smi(20));
///     Ok(())
/// });
/// let doubled = promise.then(
///     Some(Function::new(|v| match v {
///         Value::Smi(n) => Ok(Value::Smi(n * 2)),
///         other => Ok(other),
///     })),
///     None,
/// );
///
/// // Nothing runs until the microtask checkpoint.
/// assert_eq!(doubled.state(), PromiseState::Pending);
/// event_loop.run_until_done().unwrap();
/// assert_eq!(doubled.result(), Some(Value::Smi(40)));
/// ```
#[derive(Clone)]
pub struct Promise {
    inner: Rc<RefCell<PromiseInner>>,
    scheduler: SchedulerRef,
}

impl Promise {
    /// Creates a pending promise with no way to settle it from outside.
    ///
    /// Use [`Promise::with_resolvers`] to get the resolving functions too.
    pub fn pending(scheduler: &SchedulerRef) -> Self {
        let promise = Self {
            inner: Rc::new(RefCell::new(PromiseInner {
                id: next_promise_id(),
                state: PromiseState::Pending,
                result: None,
                reactions: Vec::new(),
                handled: false,
            })),
            scheduler: scheduler.clone(),
        };
        trace!(promise = %promise.id(), "created");
        promise
    }

    /// Creates a promise and runs `executor` synchronously with its
    /// resolving functions.
    ///
    /// If the executor returns `Err`, the promise is rejected with the thrown
    /// value unless it was already resolved.
    pub fn new<F>(scheduler: &SchedulerRef, executor: F) -> Self
    where
        F: FnOnce(&ResolvingFunctions) -> JsResult<()>,
    {
        let (promise, resolvers) = Self::with_resolvers(scheduler);
        if let Err(thrown) = executor(&resolvers) {
            debug!(promise = %promise.id(), %thrown, "executor threw");
            resolvers.reject(thrown);
        }
        promise
    }

    /// Creates a pending promise together with its resolving functions.
    pub fn with_resolvers(scheduler: &SchedulerRef) -> (Self, ResolvingFunctions) {
        let promise = Self::pending(scheduler);
        let resolvers = ResolvingFunctions::new(&promise);
        (promise, resolvers)
    }

    /// Returns a promise resolved with `value`.
    ///
    /// If `value` already wraps a `Promise`, that promise is returned as is,
    /// so `resolve` never adds a layer of wrapping.
    pub fn resolve(scheduler: &SchedulerRef, value: Value) -> Self {
        if let Some(promise) = Self::from_value(&value) {
            return promise;
        }
        let (promise, resolvers) = Self::with_resolvers(scheduler);
        resolvers.resolve(value);
        promise
    }

    /// Returns a promise rejected with `reason`.
    ///
    /// The reason is used as is, even when it is itself a thenable.
    pub fn reject(scheduler: &SchedulerRef, reason: Value) -> Self {
        let promise = Self::pending(scheduler);
        promise.settle(PromiseState::Rejected, reason);
        promise
    }

    /// Extracts the native promise wrapped by `value`, if any.
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .as_thenable()
            .and_then(|thenable| thenable.as_any().downcast_ref::<Self>())
            .cloned()
    }

    /// Registers fulfillment and rejection handlers.
    ///
    /// Returns a new promise resolved with the handler's result. A missing
    /// handler passes the value (or reason) through unchanged. Handlers
    /// always run from a microtask, even when this promise is already
    /// settled.
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Self {
        let (derived, resolvers) = Self::with_resolvers(&self.scheduler);
        self.add_reaction(PromiseReaction {
            on_fulfilled,
            on_rejected,
            downstream: Some(resolvers),
        });
        derived
    }

    /// Registers a rejection handler. Same as `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Function) -> Self {
        self.then(None, Some(on_rejected))
    }

    /// Registers a handler that runs on either outcome.
    ///
    /// The handler takes no arguments and the original value or reason
    /// passes through. If the handler throws, the derived promise rejects
    /// with the thrown value. If it returns a thenable, the chain waits for
    /// it, and a rejection of that thenable replaces the original outcome.
    /// Any other return value is ignored.
    pub fn finally<F>(&self, on_finally: F) -> Self
    where
        F: FnOnce() -> JsResult<Value> + 'static,
    {
        // Only one branch ever runs; both share the handler.
        let handler = Rc::new(Cell::new(Some(on_finally)));
        let on_fulfilled = {
            let handler = handler.clone();
            let scheduler = self.scheduler.clone();
            Function::new(move |value| run_finally(&scheduler, &handler, Ok(value)))
        };
        let on_rejected = {
            let scheduler = self.scheduler.clone();
            Function::new(move |reason| run_finally(&scheduler, &handler, Err(reason)))
        };
        self.then(Some(on_fulfilled), Some(on_rejected))
    }

    /// The identifier used in logs and rejection events.
    pub fn id(&self) -> PromiseId {
        self.inner.borrow().id
    }

    /// Current state.
    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state
    }

    /// The fulfillment value or rejection reason, once settled.
    pub fn result(&self) -> Option<Value> {
        self.inner.borrow().result.clone()
    }

    /// Whether any reaction has ever been attached to this promise.
    pub fn is_handled(&self) -> bool {
        self.inner.borrow().handled
    }

    /// Checks if there are reactions waiting for settlement.
    pub fn has_pending_reactions(&self) -> bool {
        !self.inner.borrow().reactions.is_empty()
    }

    /// The scheduler this promise enqueues its jobs on.
    pub fn scheduler(&self) -> &SchedulerRef {
        &self.scheduler
    }

    /// Whether both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn add_reaction(&self, reaction: PromiseReaction) {
        let mut inner = self.inner.borrow_mut();
        let was_handled = std::mem::replace(&mut inner.handled, true);
        let state = inner.state;
        if state == PromiseState::Pending {
            inner.reactions.push(reaction);
            return;
        }

        let value = inner.result.clone().unwrap_or(Value::Undefined);
        drop(inner);

        let settlement = if state == PromiseState::Fulfilled {
            Settlement::Fulfilled(value)
        } else {
            if !was_handled {
                self.scheduler
                    .track_rejection(self, RejectionOperation::Handle);
            }
            Settlement::Rejected(value)
        };
        self.scheduler.schedule(reaction.into_job(settlement));
    }

    /// Body of the resolve function, after the already-resolved check.
    fn resolve_with(&self, value: Value) {
        if Self::from_value(&value).is_some_and(|p| p.ptr_eq(self)) {
            let cycle = JsError::type_error("Chaining cycle detected for promise");
            self.settle(PromiseState::Rejected, cycle.into());
            return;
        }

        let Some(thenable) = value.as_thenable().cloned() else {
            self.settle(PromiseState::Fulfilled, value);
            return;
        };

        debug!(promise = %self.id(), "adopting thenable");
        let target = self.clone();
        self.scheduler
            .schedule(MicroTask::named("PromiseResolveThenableJob", move || {
                let resolvers = ResolvingFunctions::new(&target);
                let on_fulfilled = resolvers.clone();
                let on_rejected = resolvers.clone();
                let subscribed = thenable.subscribe(
                    Box::new(move |value| on_fulfilled.resolve(value)),
                    Box::new(move |reason| on_rejected.reject(reason)),
                );
                if let Err(thrown) = subscribed {
                    resolvers.reject(thrown);
                }
                Ok(())
            }));
    }

    fn settle(&self, state: PromiseState, value: Value) {
        let (reactions, handled) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != PromiseState::Pending {
                return;
            }
            inner.state = state;
            inner.result = Some(value.clone());
            (std::mem::take(&mut inner.reactions), inner.handled)
        };
        trace!(promise = %self.id(), ?state, reactions = reactions.len(), "settled");

        if state == PromiseState::Rejected && !handled {
            self.scheduler
                .track_rejection(self, RejectionOperation::Reject);
        }

        for reaction in reactions {
            let settlement = match state {
                PromiseState::Rejected => Settlement::Rejected(value.clone()),
                _ => Settlement::Fulfilled(value.clone()),
            };
            self.scheduler.schedule(reaction.into_job(settlement));
        }
    }
}

fn run_finally<F>(
    scheduler: &SchedulerRef,
    handler: &Cell<Option<F>>,
    outcome: JsResult<Value>,
) -> JsResult<Value>
where
    F: FnOnce() -> JsResult<Value>,
{
    let Some(on_finally) = handler.take() else {
        return outcome;
    };
    let returned = on_finally()?;
    if returned.as_thenable().is_none() {
        return outcome;
    }

    // Wait for the returned thenable, then restore the original outcome.
    let waited = Promise::resolve(scheduler, returned);
    let restored = waited.then(Some(Function::new(move |_| outcome)), None);
    Ok(restored.into())
}

impl Thenable for Promise {
    fn subscribe(&self, on_fulfilled: Reaction, on_rejected: Reaction) -> JsResult<()> {
        self.add_reaction(PromiseReaction {
            on_fulfilled: Some(Function::new(move |value| {
                on_fulfilled(value);
                Ok(Value::Undefined)
            })),
            on_rejected: Some(Function::new(move |reason| {
                on_rejected(reason);
                Ok(Value::Undefined)
            })),
            downstream: None,
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Thenable(Rc::new(promise))
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Promise")
            .field("id", &inner.id)
            .field("state", &inner.state)
            .field("result", &inner.result)
            .field("reactions", &inner.reactions.len())
            .finish()
    }
}

/// The `resolve`/`reject` pair handed to an executor.
///
/// Clones share one "already resolved" flag: the first call to either
/// function wins and every later call is a no-op. Resolving with a thenable
/// counts as the first call even though the promise stays pending while it
/// adopts the thenable's outcome.
#[derive(Clone)]
pub struct ResolvingFunctions {
    promise: Promise,
    already_resolved: Rc<Cell<bool>>,
}

impl ResolvingFunctions {
    fn new(promise: &Promise) -> Self {
        Self {
            promise: promise.clone(),
            already_resolved: Rc::new(Cell::new(false)),
        }
    }

    /// Resolves the promise, adopting `value` if it is a thenable.
    pub fn resolve(&self, value: impl Into<Value>) {
        if self.already_resolved.replace(true) {
            return;
        }
        self.promise.resolve_with(value.into());
    }

    /// Rejects the promise with `reason`.
    pub fn reject(&self, reason: impl Into<Value>) {
        if self.already_resolved.replace(true) {
            return;
        }
        self.promise.settle(PromiseState::Rejected, reason.into());
    }

    /// Whether either function has already been called.
    pub fn is_resolved(&self) -> bool {
        self.already_resolved.get()
    }
}

impl fmt::Debug for ResolvingFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvingFunctions")
            .field("promise", &self.promise.id())
            .field("already_resolved", &self.already_resolved.get())
            .finish()
    }
}
