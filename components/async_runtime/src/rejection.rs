//! Unhandled-rejection tracking.
//!
//! A rejected promise is reported as unhandled when it still has no handler
//! at the end of the microtask checkpoint in which it was rejected. If a
//! handler shows up later, a [`RejectionEvent::Handled`] follows the earlier
//! [`RejectionEvent::Unhandled`] for the same promise.

use crate::promise::{Promise, PromiseId};
use core_types::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// What happened to a promise, as reported through
/// [`Scheduler::track_rejection`](crate::Scheduler::track_rejection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOperation {
    /// The promise was rejected with no handler attached.
    Reject,
    /// A handler was attached to a rejected promise that had none.
    Handle,
}

/// An observation emitted by the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionEvent {
    /// A rejection nobody handled within its checkpoint.
    Unhandled {
        /// The rejected promise
        promise: PromiseId,
        /// Its rejection reason
        reason: Value,
    },
    /// A handler was attached after the rejection had been reported.
    Handled {
        /// The promise that is now handled
        promise: PromiseId,
    },
}

type RejectionHook = Rc<dyn Fn(&RejectionEvent)>;

/// Bookkeeping behind the unhandled-rejection channel.
pub struct RejectionTracker {
    enabled: Cell<bool>,
    /// Rejected without a handler during the current checkpoint.
    about_to_be_notified: RefCell<Vec<Promise>>,
    /// Reported as unhandled and not handled since.
    outstanding: RefCell<HashSet<PromiseId>>,
    events: RefCell<Vec<RejectionEvent>>,
    hook: RefCell<Option<RejectionHook>>,
}

impl RejectionTracker {
    /// Creates a tracker. A disabled tracker ignores every notification.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Cell::new(enabled),
            about_to_be_notified: RefCell::new(Vec::new()),
            outstanding: RefCell::new(HashSet::new()),
            events: RefCell::new(Vec::new()),
            hook: RefCell::new(None),
        }
    }

    /// Records a rejection or a late handler.
    pub fn track(&self, promise: &Promise, operation: RejectionOperation) {
        if !self.enabled.get() {
            return;
        }
        match operation {
            RejectionOperation::Reject => {
                self.about_to_be_notified.borrow_mut().push(promise.clone());
            }
            RejectionOperation::Handle => {
                {
                    let mut pending = self.about_to_be_notified.borrow_mut();
                    if let Some(pos) = pending.iter().position(|p| p.ptr_eq(promise)) {
                        pending.remove(pos);
                        return;
                    }
                }
                if self.outstanding.borrow_mut().remove(&promise.id()) {
                    self.emit(RejectionEvent::Handled {
                        promise: promise.id(),
                    });
                }
            }
        }
    }

    /// Reports every rejection of the finished checkpoint that is still
    /// unhandled. Returns how many were reported.
    pub fn notify(&self) -> usize {
        let pending = std::mem::take(&mut *self.about_to_be_notified.borrow_mut());
        let mut reported = 0;
        for promise in pending.into_iter().filter(|p| !p.is_handled()) {
            self.outstanding.borrow_mut().insert(promise.id());
            self.emit(RejectionEvent::Unhandled {
                promise: promise.id(),
                reason: promise.result().unwrap_or(Value::Undefined),
            });
            reported += 1;
        }
        reported
    }

    /// Installs a callback invoked for every event as it is emitted.
    pub fn set_hook(&self, hook: impl Fn(&RejectionEvent) + 'static) {
        *self.hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> Vec<RejectionEvent> {
        self.events.borrow().clone()
    }

    /// Removes and returns the events emitted so far.
    pub fn take_events(&self) -> Vec<RejectionEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Promises reported as unhandled that still have no handler.
    pub fn outstanding(&self) -> usize {
        self.outstanding.borrow().len()
    }

    fn emit(&self, event: RejectionEvent) {
        match &event {
            RejectionEvent::Unhandled { promise, reason } => {
                warn!(%promise, %reason, "unhandled promise rejection");
            }
            RejectionEvent::Handled { promise } => {
                debug!(%promise, "promise rejection handled late");
            }
        }
        self.events.borrow_mut().push(event.clone());
        // The hook may attach handlers or replace itself.
        let hook = self.hook.borrow().clone();
        if let Some(hook) = hook {
            hook(&event);
        }
    }
}

impl Default for RejectionTracker {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for RejectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RejectionTracker")
            .field("enabled", &self.enabled.get())
            .field("pending", &self.about_to_be_notified.borrow().len())
            .field("outstanding", &self.outstanding.borrow().len())
            .field("events", &self.events.borrow().len())
            .finish()
    }
}
