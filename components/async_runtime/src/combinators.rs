//! `Promise.all`, `Promise.allSettled`, `Promise.race` and `Promise.any`.
//!
//! Every input goes through [`Promise::resolve`] first, so plain values,
//! native promises and foreign thenables can be mixed freely.

use crate::promise::{Function, Promise, ResolvingFunctions, SchedulerRef};
use core_types::{JsError, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Collects one result per input and hands the full list over once the
/// last slot is filled.
struct Slots {
    values: RefCell<Vec<Value>>,
    remaining: Cell<usize>,
}

impl Slots {
    fn new(len: usize) -> Rc<Self> {
        Rc::new(Self {
            values: RefCell::new(vec![Value::Undefined; len]),
            remaining: Cell::new(len),
        })
    }

    /// Stores `value` at `index`; returns every value once all are in.
    fn fill(&self, index: usize, value: Value) -> Option<Vec<Value>> {
        if let Some(slot) = self.values.borrow_mut().get_mut(index) {
            *slot = value;
        }
        let remaining = self.remaining.get().saturating_sub(1);
        self.remaining.set(remaining);
        (remaining == 0).then(|| self.values.take())
    }
}

fn forward(resolvers: ResolvingFunctions, reject: bool) -> Function {
    Function::new(move |value| {
        if reject {
            resolvers.reject(value);
        } else {
            resolvers.resolve(value);
        }
        Ok(Value::Undefined)
    })
}

impl Promise {
    /// Fulfills with every input's value, in input order, or rejects with
    /// the first rejection.
    pub fn all(scheduler: &SchedulerRef, values: Vec<Value>) -> Promise {
        let (result, resolvers) = Promise::with_resolvers(scheduler);
        if values.is_empty() {
            resolvers.resolve(Value::array(Vec::new()));
            return result;
        }

        let slots = Slots::new(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let (slots, done) = (slots.clone(), resolvers.clone());
            let on_fulfilled = Function::new(move |value| {
                if let Some(all) = slots.fill(index, value) {
                    done.resolve(Value::array(all));
                }
                Ok(Value::Undefined)
            });
            Promise::resolve(scheduler, value).then(
                Some(on_fulfilled),
                Some(forward(resolvers.clone(), true)),
            );
        }
        result
    }

    /// Fulfills once every input settles, with one record per input:
    /// `{status: "fulfilled", value}` or `{status: "rejected", reason}`.
    pub fn all_settled(scheduler: &SchedulerRef, values: Vec<Value>) -> Promise {
        let (result, resolvers) = Promise::with_resolvers(scheduler);
        if values.is_empty() {
            resolvers.resolve(Value::array(Vec::new()));
            return result;
        }

        let slots = Slots::new(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let record = |status: &'static str, key: &'static str| {
                let (slots, done) = (slots.clone(), resolvers.clone());
                Function::new(move |value| {
                    let entry = Value::object([("status", Value::from(status)), (key, value)]);
                    if let Some(all) = slots.fill(index, entry) {
                        done.resolve(Value::array(all));
                    }
                    Ok(Value::Undefined)
                })
            };
            Promise::resolve(scheduler, value).then(
                Some(record("fulfilled", "value")),
                Some(record("rejected", "reason")),
            );
        }
        result
    }

    /// Settles like whichever input settles first. Stays pending forever on
    /// empty input.
    pub fn race(scheduler: &SchedulerRef, values: Vec<Value>) -> Promise {
        let (result, resolvers) = Promise::with_resolvers(scheduler);
        for value in values {
            Promise::resolve(scheduler, value).then(
                Some(forward(resolvers.clone(), false)),
                Some(forward(resolvers.clone(), true)),
            );
        }
        result
    }

    /// Fulfills with the first fulfillment, or rejects with an
    /// `AggregateError` holding every reason in input order.
    pub fn any(scheduler: &SchedulerRef, values: Vec<Value>) -> Promise {
        let (result, resolvers) = Promise::with_resolvers(scheduler);
        if values.is_empty() {
            resolvers.reject(JsError::aggregate("All promises were rejected", Vec::new()));
            return result;
        }

        let slots = Slots::new(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let (slots, done) = (slots.clone(), resolvers.clone());
            let on_rejected = Function::new(move |reason| {
                if let Some(errors) = slots.fill(index, reason) {
                    done.reject(JsError::aggregate("All promises were rejected", errors));
                }
                Ok(Value::Undefined)
            });
            Promise::resolve(scheduler, value).then(
                Some(forward(resolvers.clone(), false)),
                Some(on_rejected),
            );
        }
        result
    }
}
