//! Unit tests for Promise.all / allSettled / race / any

use async_runtime::{EventLoop, Function, Promise, PromiseState};
use core_types::{ErrorKind, Value};

#[test]
fn all_preserves_input_order() {
    let event_loop = EventLoop::new();
    let (slow, slow_resolvers) = event_loop.with_resolvers();
    let all = Promise::all(
        &event_loop.scheduler(),
        vec![slow.into(), Value::Smi(2), event_loop.resolve(3).into()],
    );

    event_loop.run_until_done().unwrap();
    assert_eq!(all.state(), PromiseState::Pending);

    slow_resolvers.resolve(1);
    event_loop.run_until_done().unwrap();
    assert_eq!(
        all.result(),
        Some(Value::array(vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]))
    );
}

#[test]
fn all_rejects_with_first_rejection() {
    let event_loop = EventLoop::new();
    let all = Promise::all(
        &event_loop.scheduler(),
        vec![Value::Smi(1), event_loop.reject("first").into(), event_loop.reject("second").into()],
    );
    let _ = all.catch(Function::new(Ok));

    event_loop.run_until_done().unwrap();
    assert_eq!(all.state(), PromiseState::Rejected);
    assert_eq!(all.result(), Some(Value::from("first")));
    assert!(event_loop.unhandled_rejections().is_empty());
}

#[test]
fn all_of_nothing_fulfills_immediately() {
    let event_loop = EventLoop::new();
    let all = Promise::all(&event_loop.scheduler(), Vec::new());
    assert_eq!(all.result(), Some(Value::array(Vec::new())));
}

#[test]
fn all_settled_reports_each_outcome() {
    let event_loop = EventLoop::new();
    let settled = Promise::all_settled(
        &event_loop.scheduler(),
        vec![Value::Smi(1), event_loop.reject("no").into()],
    );

    event_loop.run_until_done().unwrap();
    assert_eq!(
        settled.result(),
        Some(Value::array(vec![
            Value::object([("status", Value::from("fulfilled")), ("value", Value::Smi(1))]),
            Value::object([("status", Value::from("rejected")), ("reason", Value::from("no"))]),
        ]))
    );
    assert!(event_loop.unhandled_rejections().is_empty());
}

#[test]
fn race_settles_with_first_to_settle() {
    let event_loop = EventLoop::new();
    let (never, _keep) = event_loop.with_resolvers();
    let (timer, timer_resolvers) = event_loop.with_resolvers();
    event_loop.set_timeout(100, move || {
        timer_resolvers.reject("timeout");
        Ok(())
    });

    let raced = Promise::race(&event_loop.scheduler(), vec![never.into(), timer.into()]);
    let caught = raced.catch(Function::new(Ok));

    event_loop.run_until_done().unwrap();
    assert_eq!(caught.result(), Some(Value::from("timeout")));
    assert_eq!(event_loop.now(), 100);
}

#[test]
fn race_of_nothing_stays_pending() {
    let event_loop = EventLoop::new();
    let raced = Promise::race(&event_loop.scheduler(), Vec::new());
    event_loop.run_until_done().unwrap();
    assert_eq!(raced.state(), PromiseState::Pending);
}

#[test]
fn any_fulfills_with_first_fulfillment() {
    let event_loop = EventLoop::new();
    let any = Promise::any(
        &event_loop.scheduler(),
        vec![event_loop.reject("a").into(), Value::from("b"), Value::from("c")],
    );

    event_loop.run_until_done().unwrap();
    assert_eq!(any.result(), Some(Value::from("b")));
}

#[test]
fn any_rejects_with_aggregate_error() {
    let event_loop = EventLoop::new();
    let any = Promise::any(
        &event_loop.scheduler(),
        vec![event_loop.reject("a").into(), event_loop.reject("b").into()],
    );
    let _ = any.catch(Function::new(Ok));

    event_loop.run_until_done().unwrap();
    let reason = any.result().unwrap();
    let error = reason.as_error().unwrap();
    assert_eq!(error.kind, ErrorKind::AggregateError);
    assert_eq!(error.errors, vec![Value::from("a"), Value::from("b")]);
}

#[test]
fn any_of_nothing_rejects_immediately() {
    let event_loop = EventLoop::new();
    let any = Promise::any(&event_loop.scheduler(), Vec::new());
    let _ = any.catch(Function::new(Ok));
    assert_eq!(any.state(), PromiseState::Rejected);
}
