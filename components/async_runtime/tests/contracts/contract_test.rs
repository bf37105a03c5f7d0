//! Contract tests for the async_runtime component
//!
//! These tests pin down the public surface: signatures, the scheduler seam,
//! and the guarantees other components build on.

use async_runtime::{
    EventLoop, Function, MicroTask, MicrotaskQueue, Promise, PromiseState, RejectionOperation,
    ResolvingFunctions, RuntimeConfig, RuntimeError, Scheduler, SchedulerRef, Task, TimerId,
};
use core_types::{JsResult, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// A scheduler that records every interaction instead of running anything.
#[derive(Default)]
struct RecordingScheduler {
    queue: MicrotaskQueue,
    rejections: RefCell<Vec<RejectionOperation>>,
}

impl Scheduler for RecordingScheduler {
    fn schedule(&self, job: MicroTask) {
        self.queue.enqueue(job);
    }

    fn track_rejection(&self, _promise: &Promise, operation: RejectionOperation) {
        self.rejections.borrow_mut().push(operation);
    }
}

fn recording() -> (Rc<RecordingScheduler>, SchedulerRef) {
    let recorder = Rc::new(RecordingScheduler::default());
    let scheduler: SchedulerRef = recorder.clone();
    (recorder, scheduler)
}

mod scheduler_contract {
    use super::*;

    #[test]
    fn promise_jobs_go_through_injected_scheduler() {
        let (recorder, scheduler) = recording();
        let promise = Promise::resolve(&scheduler, Value::Smi(1));
        let _chained = promise.then(None, None);
        assert_eq!(recorder.queue.len(), 1);
        assert_eq!(
            recorder.queue.dequeue().map(|job| job.name()),
            Some("PromiseReactionJob")
        );
    }

    #[test]
    fn thenable_adoption_is_its_own_job() {
        let (recorder, scheduler) = recording();
        let inner = Promise::resolve(&scheduler, Value::Smi(1));
        let outer = Promise::new(&scheduler, move |resolvers| {
            resolvers.resolve(inner);
            Ok(())
        });
        assert_eq!(outer.state(), PromiseState::Pending);
        assert_eq!(
            recorder.queue.dequeue().map(|job| job.name()),
            Some("PromiseResolveThenableJob")
        );
    }

    #[test]
    fn rejection_operations_are_reported_to_scheduler() {
        let (recorder, scheduler) = recording();
        let promise = Promise::reject(&scheduler, Value::from("r"));
        let _ = promise.catch(Function::new(Ok));
        // A second handler does not report again.
        let _ = promise.catch(Function::new(Ok));
        assert_eq!(
            *recorder.rejections.borrow(),
            vec![RejectionOperation::Reject, RejectionOperation::Handle]
        );
    }

    #[test]
    fn rejection_with_handler_attached_is_not_reported() {
        let (recorder, scheduler) = recording();
        let (promise, resolvers) = Promise::with_resolvers(&scheduler);
        let _ = promise.catch(Function::new(Ok));
        resolvers.reject("r");
        assert!(recorder.rejections.borrow().is_empty());
    }
}

mod promise_contract {
    use super::*;

    #[test]
    fn promise_new_takes_executor_returning_js_result() {
        let event_loop = EventLoop::new();
        let executor = |_: &ResolvingFunctions| -> JsResult<()> { Ok(()) };
        let promise: Promise = Promise::new(&event_loop.scheduler(), executor);
        assert_eq!(promise.state(), PromiseState::Pending);
    }

    #[test]
    fn then_returns_new_promise() {
        let event_loop = EventLoop::new();
        let promise = event_loop.resolve(1);
        let chained: Promise = promise.then(None, None);
        assert!(!chained.ptr_eq(&promise));
    }

    #[test]
    fn catch_and_finally_return_new_promises() {
        let event_loop = EventLoop::new();
        let promise = event_loop.resolve(1);
        let caught: Promise = promise.catch(Function::new(Ok));
        let finished: Promise = promise.finally(|| Ok(Value::Undefined));
        assert!(!caught.ptr_eq(&promise));
        assert!(!finished.ptr_eq(&caught));
    }

    #[test]
    fn promise_ids_are_unique() {
        let event_loop = EventLoop::new();
        let a = event_loop.resolve(1);
        let b = event_loop.resolve(1);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn clones_share_state() {
        let event_loop = EventLoop::new();
        let (promise, resolvers) = event_loop.with_resolvers();
        let clone = promise.clone();
        resolvers.resolve("shared");
        assert_eq!(clone.result(), Some(Value::from("shared")));
        assert!(clone.ptr_eq(&promise));
    }
}

mod event_loop_contract {
    use super::*;

    #[test]
    fn run_until_done_returns_runtime_result() {
        let event_loop = EventLoop::new();
        let result: Result<(), RuntimeError> = event_loop.run_until_done();
        assert!(result.is_ok());
    }

    #[test]
    fn set_timeout_returns_distinct_ids() {
        let event_loop = EventLoop::new();
        let a: TimerId = event_loop.set_timeout(0, || Ok(()));
        let b: TimerId = event_loop.set_timeout(0, || Ok(()));
        assert_ne!(a, b);
    }

    #[test]
    fn enqueue_task_accepts_task() {
        let event_loop = EventLoop::new();
        event_loop.enqueue_task(Task::new(|| Ok(())));
        assert!(!event_loop.is_task_queue_empty());
    }

    #[test]
    fn with_config_keeps_config() {
        let config = RuntimeConfig::default().with_microtask_limit(Some(5));
        let event_loop = EventLoop::with_config(config.clone());
        assert_eq!(event_loop.config(), &config);
    }

    #[test]
    fn clones_drive_the_same_loop() {
        let event_loop = EventLoop::new();
        let clone = event_loop.clone();
        clone.queue_microtask(|| Ok(()));
        assert!(!event_loop.is_microtask_queue_empty());
    }
}
