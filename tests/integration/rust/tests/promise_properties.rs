//! Promise behaviour driven through a real event loop
//!
//! Each test follows a promise chain from construction to settlement with
//! timers, microtasks and rejection tracking all live.

use async_runtime::{EventLoop, Function, Promise, PromiseState};
use core_types::{JsError, Value};
use integration_tests::{drain, Log};
use proptest::prelude::*;

#[test]
fn test_settle_once() {
    let event_loop = EventLoop::new();
    let promise = event_loop.new_promise(|resolvers| {
        resolvers.resolve(1);
        resolvers.reject(JsError::error("ignored"));
        resolvers.resolve(2);
        Ok(())
    });
    drain(&event_loop);

    assert_eq!(promise.state(), PromiseState::Fulfilled);
    assert_eq!(promise.result(), Some(Value::Smi(1)));
}

#[test]
fn test_adoption_of_resolved_promise() {
    let event_loop = EventLoop::new();
    let log = Log::new();
    let inner = event_loop.resolve(42);
    event_loop
        .new_promise(|resolvers| {
            resolvers.resolve(inner.clone());
            Ok(())
        })
        .then(Some(log.tap("outer")), None);
    drain(&event_loop);

    assert_eq!(log.entries(), vec!["outer:42"]);
}

#[test]
fn test_adoption_waits_for_timer() {
    let event_loop = EventLoop::new();
    let (inner, resolvers) = event_loop.with_resolvers();
    event_loop.set_timeout(250, move || {
        resolvers.reject(JsError::error("late failure"));
        Ok(())
    });
    let outer = event_loop.resolve(Value::Undefined).then(
        Some(Function::new(move |_| Ok(inner.into()))),
        None,
    );
    drain(&event_loop);

    assert_eq!(event_loop.now(), 250);
    assert_eq!(outer.state(), PromiseState::Rejected);
    assert_eq!(
        outer.result(),
        Some(Value::from(JsError::error("late failure")))
    );
}

#[test]
fn test_handlers_run_in_registration_order_across_settlement() {
    let event_loop = EventLoop::new();
    let log = Log::new();
    let (promise, resolvers) = event_loop.with_resolvers();

    promise.then(Some(log.tap("r1")), None);
    promise.then(Some(log.tap("r2")), None);
    let late = promise.clone();
    let late_log = log.clone();
    event_loop.set_timeout(5, move || {
        resolvers.resolve("v");
        late.then(Some(late_log.tap("r3")), None);
        Ok(())
    });
    drain(&event_loop);

    assert_eq!(log.entries(), vec!["r1:v", "r2:v", "r3:v"]);
}

#[test]
fn test_rejection_passes_through_missing_handler() {
    let event_loop = EventLoop::new();
    let log = Log::new();
    event_loop
        .reject("x")
        .then(
            Some(Function::new(|_| Ok(Value::from("unused")))),
            None,
        )
        .catch(log.tap("caught"));
    drain(&event_loop);

    assert_eq!(log.entries(), vec!["caught:x"]);
    assert!(event_loop.unhandled_rejections().is_empty());
}

#[test]
fn test_finally_keeps_value() {
    let event_loop = EventLoop::new();
    let log = Log::new();
    event_loop
        .resolve(5)
        .finally(|| Ok(Value::Smi(999)))
        .then(Some(log.tap("value")), None);
    drain(&event_loop);

    assert_eq!(log.entries(), vec!["value:5"]);
}

#[test]
fn test_finally_throw_replaces_value() {
    let event_loop = EventLoop::new();
    let log = Log::new();
    event_loop
        .resolve(5)
        .finally(|| Err(Value::from("cleanup failed")))
        .catch(log.tap("reason"));
    drain(&event_loop);

    assert_eq!(log.entries(), vec!["reason:cleanup failed"]);
}

#[test]
fn test_finally_waits_for_returned_promise() {
    let event_loop = EventLoop::new();
    let log = Log::new();
    let (gate, open) = event_loop.with_resolvers();
    event_loop.set_timeout(30, move || {
        open.resolve(Value::Undefined);
        Ok(())
    });
    let timer_log = log.clone();
    event_loop.set_timeout(10, move || {
        timer_log.push("timer:10");
        Ok(())
    });

    event_loop
        .reject("original")
        .finally(move || Ok(gate.into()))
        .catch(log.tap("reason"));
    drain(&event_loop);

    assert_eq!(log.entries(), vec!["timer:10", "reason:original"]);
    assert_eq!(event_loop.now(), 30);
}

#[test]
fn test_microtasks_before_timers() {
    let event_loop = EventLoop::new();
    let log = Log::new();

    let timer_log = log.clone();
    event_loop.set_timeout(0, move || {
        timer_log.push("B");
        Ok(())
    });
    let then_log = log.clone();
    event_loop.resolve(Value::Undefined).then(
        Some(Function::new(move |_| {
            then_log.push("A");
            Ok(Value::Undefined)
        })),
        None,
    );
    log.push("C");
    drain(&event_loop);

    assert_eq!(log.entries(), vec!["C", "A", "B"]);
}

#[test]
fn test_resolve_does_not_double_wrap() {
    let event_loop = EventLoop::new();
    let original = event_loop.resolve(7);
    let again = Promise::resolve(&event_loop.scheduler(), original.clone().into());
    assert!(again.ptr_eq(&original));

    let log = Log::new();
    again.then(Some(log.tap("value")), None);
    drain(&event_loop);
    assert_eq!(log.entries(), vec!["value:7"]);
}

#[test]
fn test_executor_exception_becomes_rejection() {
    let event_loop = EventLoop::new();
    let log = Log::new();
    event_loop
        .new_promise(|_| Err(JsError::error("boom").into()))
        .catch(log.tap("error"));
    drain(&event_loop);

    assert_eq!(log.entries(), vec!["error:Error: boom"]);
}

#[test]
fn test_self_resolution_rejects_with_type_error() {
    let event_loop = EventLoop::new();
    let (promise, resolvers) = event_loop.with_resolvers();
    resolvers.resolve(promise.clone());
    drain(&event_loop);

    assert_eq!(promise.state(), PromiseState::Rejected);
    let reason = promise.result().unwrap();
    assert_eq!(
        reason.as_error().map(|error| error.kind),
        Some(core_types::ErrorKind::TypeError)
    );
}

#[test]
fn test_unhandled_rejection_reported_once_per_checkpoint() {
    let event_loop = EventLoop::new();
    event_loop.reject("lost");
    let handled = event_loop.reject("found");
    handled.catch(Function::new(|_| Ok(Value::Undefined)));
    drain(&event_loop);

    assert_eq!(event_loop.unhandled_rejections(), vec![Value::from("lost")]);
}

proptest! {
    #[test]
    fn prop_chain_of_increments(steps in 0usize..40, start in -1000i32..1000) {
        let event_loop = EventLoop::new();
        let mut promise = event_loop.resolve(start);
        for _ in 0..steps {
            promise = promise.then(
                Some(Function::new(|value| match value {
                    Value::Smi(n) => Ok(Value::Smi(n + 1)),
                    other => Err(other),
                })),
                None,
            );
        }
        drain(&event_loop);

        prop_assert_eq!(promise.result(), Some(Value::Smi(start + steps as i32)));
    }

    #[test]
    fn prop_timers_fire_in_due_order(delays in proptest::collection::vec(0u64..100, 1..12)) {
        let event_loop = EventLoop::new();
        let log = Log::new();
        for (index, delay) in delays.iter().copied().enumerate() {
            let log = log.clone();
            event_loop.set_timeout(delay, move || {
                log.push(format!("{delay}:{index}"));
                Ok(())
            });
        }
        drain(&event_loop);

        let mut expected: Vec<(u64, usize)> =
            delays.iter().copied().enumerate().map(|(i, d)| (d, i)).collect();
        expected.sort();
        let expected: Vec<String> = expected.into_iter().map(|(d, i)| format!("{d}:{i}")).collect();
        prop_assert_eq!(log.entries(), expected);
    }
}
