//! The thenable capability.
//!
//! Resolution never inspects a value's concrete type to decide whether to
//! adopt it. Anything that can register a fulfillment/rejection pair
//! implements [`Thenable`], and resolution dispatches through that trait.

use crate::{JsResult, Value};
use std::any::Any;

/// A one-shot continuation handed to [`Thenable::subscribe`].
pub type Reaction = Box<dyn FnOnce(Value)>;

/// Something whose eventual outcome can be observed through a pair of
/// continuations.
///
/// Implementations should call at most one of the two reactions, at most
/// once. Callers must not rely on that: the runtime guards its own
/// resolving functions against repeated or mixed calls.
///
/// # Examples
///
/// ```
/// use core_types::{JsResult, Reaction, Thenable, Value};
/// use std::any::Any;
///
/// /// A foreign thenable that fulfills synchronously.
/// struct Ready(Value);
///
/// impl Thenable for Ready {
///     fn subscribe(&self, on_fulfilled: Reaction, _on_rejected: Reaction) -> JsResult<()> {
///         on_fulfilled(self.0.clone());
///         Ok(())
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let ready = Ready(Value::Smi(7));
/// let seen = std::rc::Rc::new(std::cell::Cell::new(0));
/// let s = seen.clone();
/// ready
///     .subscribe(
///         Box::new(move |v| if let Value::Smi(n) = v { s.set(n) }),
///         Box::new(|_| {}),
///     )
///     .unwrap();
/// assert_eq!(seen.get(), 7);
/// ```
pub trait Thenable {
    /// Registers `on_fulfilled`/`on_rejected` as continuations.
    ///
    /// Returning `Err` is the equivalent of a `then` method that throws.
    fn subscribe(&self, on_fulfilled: Reaction, on_rejected: Reaction) -> JsResult<()>;

    /// Upcast used to recognise native promises without reflection on
    /// arbitrary values.
    fn as_any(&self) -> &dyn Any;
}
