//! Shared helpers for the unit tests

use async_runtime::Function;
use core_types::{JsResult, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// An append-only log shared between handlers.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// A handler that records `label` and passes its argument through.
    pub fn record(&self, label: &str) -> Option<Function> {
        let log = self.clone();
        let label = label.to_string();
        Some(Function::new(move |value| {
            log.push(label);
            Ok(value)
        }))
    }

    /// A handler that records `label:value` and passes its argument through.
    pub fn record_value(&self, label: &str) -> Option<Function> {
        let log = self.clone();
        let label = label.to_string();
        Some(Function::new(move |value| {
            log.push(format!("{}:{}", label, value));
            Ok(value)
        }))
    }
}

/// Wraps a closure as an optional handler.
pub fn handler<F>(f: F) -> Option<Function>
where
    F: FnOnce(Value) -> JsResult<Value> + 'static,
{
    Some(Function::new(f))
}
