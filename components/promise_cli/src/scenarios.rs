//! Named demonstration scenarios.
//!
//! Each scenario wires up promises and timers on a fresh [`EventLoop`],
//! records what its callbacks observe into a [`Transcript`], and carries the
//! transcript a conforming runtime produces.

use crate::error::CliResult;
use async_runtime::{EventLoop, Function, Promise, RejectionEvent, RuntimeConfig};
use core_types::{JsError, JsResult, Value};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Lines recorded by scenario callbacks, in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line.
    pub fn log(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    /// The lines recorded so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// A reaction that logs `prefix` followed by the value it receives.
    pub fn reaction(&self, prefix: &'static str) -> Function {
        let transcript = self.clone();
        Function::new(move |value| {
            transcript.log(format!("{prefix}{value}"));
            Ok(Value::Undefined)
        })
    }
}

/// A runnable scenario.
pub struct Scenario {
    /// Name used on the command line
    pub name: &'static str,
    /// One-line summary for `list`
    pub description: &'static str,
    /// Transcript of a conforming run
    pub expected: &'static [&'static str],
    setup: fn(&EventLoop, &Transcript),
}

/// What a scenario run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Scenario name
    pub name: String,
    /// Recorded transcript
    pub lines: Vec<String>,
    /// Expected transcript
    pub expected: Vec<String>,
    /// Virtual time at which the loop went idle
    pub elapsed_ms: u64,
}

impl Outcome {
    /// Whether the recorded transcript is the expected one.
    pub fn matches(&self) -> bool {
        self.lines == self.expected
    }
}

static SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "ordering",
        description: "synchronous code, then microtasks, then timers",
        expected: &["C", "A", "B"],
        setup: ordering,
    },
    Scenario {
        name: "chaining",
        description: "values and errors flowing through a then/catch chain",
        expected: &["got 1", "caught: TypeError: bad input 2", "recovered with 10"],
        setup: chaining,
    },
    Scenario {
        name: "adoption",
        description: "a promise resolved with a pending promise follows it",
        expected: &["inner resolved", "outer fulfilled with 42"],
        setup: adoption,
    },
    Scenario {
        name: "finally",
        description: "finally handlers run on both outcomes and pass them through",
        expected: &[
            "cleanup after success",
            "cleanup after failure",
            "value: 5",
            "reason: oops",
        ],
        setup: finally,
    },
    Scenario {
        name: "settle-once",
        description: "only the first resolve or reject takes effect",
        expected: &["fulfilled with 1"],
        setup: settle_once,
    },
    Scenario {
        name: "unhandled",
        description: "a rejection reported unhandled, then handled late",
        expected: &[
            "unhandled: nobody listens",
            "handled late",
            "caught: nobody listens",
        ],
        setup: unhandled,
    },
    Scenario {
        name: "timeout-race",
        description: "racing a slow operation against a timeout",
        expected: &["race lost: Error: timed out after 100ms", "slow operation finished"],
        setup: timeout_race,
    },
    Scenario {
        name: "combinators",
        description: "all, allSettled and any over mixed inputs",
        expected: &[
            "allSettled: fulfilled,rejected",
            "any: AggregateError: All promises were rejected (2 errors)",
            "all: 1,2,3",
        ],
        setup: combinators,
    },
];

/// Every scenario, in catalogue order.
pub fn all() -> &'static [Scenario] {
    SCENARIOS
}

/// Looks a scenario up by name.
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.name == name)
}

/// Runs `scenario` on a fresh loop until no work is left.
pub fn run(scenario: &Scenario, config: &RuntimeConfig) -> CliResult<Outcome> {
    debug!(scenario = scenario.name, "running scenario");
    let event_loop = EventLoop::with_config(config.clone());
    let transcript = Transcript::new();
    (scenario.setup)(&event_loop, &transcript);
    event_loop.run_until_done()?;

    Ok(Outcome {
        name: scenario.name.to_string(),
        lines: transcript.lines(),
        expected: scenario.expected.iter().map(|line| line.to_string()).collect(),
        elapsed_ms: event_loop.now(),
    })
}

/// Adds one to a small integer; anything else is thrown as a `TypeError`.
fn increment(value: Value) -> JsResult<Value> {
    match value {
        Value::Smi(n) => n
            .checked_add(1)
            .map(Value::Smi)
            .ok_or_else(|| JsError::type_error(format!("{n} + 1 overflows")).into()),
        other => Err(JsError::type_error(format!("{other} is not a small integer")).into()),
    }
}

fn ordering(event_loop: &EventLoop, transcript: &Transcript) {
    let t = transcript.clone();
    event_loop.set_timeout(0, move || {
        t.log("B");
        Ok(())
    });
    event_loop.resolve(Value::Undefined).then(
        Some({
            let t = transcript.clone();
            Function::new(move |_| {
                t.log("A");
                Ok(Value::Undefined)
            })
        }),
        None,
    );
    transcript.log("C");
}

fn chaining(event_loop: &EventLoop, transcript: &Transcript) {
    let t = transcript.clone();
    let t2 = transcript.clone();
    event_loop
        .resolve(1)
        .then(
            Some(Function::new(move |value| {
                t.log(format!("got {value}"));
                increment(value)
            })),
            None,
        )
        .then(
            Some(Function::new(|value| {
                Err(JsError::type_error(format!("bad input {value}")).into())
            })),
            None,
        )
        .then(Some(transcript.reaction("unreachable: ")), None)
        .catch(Function::new(move |reason| {
            t2.log(format!("caught: {reason}"));
            Ok(Value::Smi(10))
        }))
        .then(Some(transcript.reaction("recovered with ")), None);
}

fn adoption(event_loop: &EventLoop, transcript: &Transcript) {
    let (inner, resolvers) = event_loop.with_resolvers();
    let t = transcript.clone();
    event_loop.set_timeout(10, move || {
        t.log("inner resolved");
        resolvers.resolve(42);
        Ok(())
    });

    let outer = event_loop.new_promise(|resolvers| {
        resolvers.resolve(inner.clone());
        Ok(())
    });
    outer.then(Some(transcript.reaction("outer fulfilled with ")), None);
}

fn finally(event_loop: &EventLoop, transcript: &Transcript) {
    let t = transcript.clone();
    event_loop
        .resolve(5)
        .finally(move || {
            t.log("cleanup after success");
            Ok(Value::Undefined)
        })
        .then(Some(transcript.reaction("value: ")), None);

    let t = transcript.clone();
    event_loop
        .reject("oops")
        .finally(move || {
            t.log("cleanup after failure");
            Ok(Value::Undefined)
        })
        .catch(transcript.reaction("reason: "));
}

fn settle_once(event_loop: &EventLoop, transcript: &Transcript) {
    let promise = event_loop.new_promise(|resolvers| {
        resolvers.resolve(1);
        resolvers.reject(JsError::error("too late"));
        resolvers.resolve(2);
        Err(Value::from("thrown after resolving"))
    });
    promise.then(
        Some(transcript.reaction("fulfilled with ")),
        Some(transcript.reaction("rejected with ")),
    );
}

fn unhandled(event_loop: &EventLoop, transcript: &Transcript) {
    let t = transcript.clone();
    event_loop.on_rejection_event(move |event| match event {
        RejectionEvent::Unhandled { reason, .. } => t.log(format!("unhandled: {reason}")),
        RejectionEvent::Handled { .. } => t.log("handled late"),
    });

    let rejected = event_loop.reject("nobody listens");
    let reaction = transcript.reaction("caught: ");
    event_loop.set_timeout(0, move || {
        rejected.catch(reaction);
        Ok(())
    });
}

fn timeout_race(event_loop: &EventLoop, transcript: &Transcript) {
    let (slow, finish) = event_loop.with_resolvers();
    let t = transcript.clone();
    event_loop.set_timeout(500, move || {
        t.log("slow operation finished");
        finish.resolve("payload");
        Ok(())
    });

    let (timeout, expire) = event_loop.with_resolvers();
    event_loop.set_timeout(100, move || {
        expire.reject(JsError::error("timed out after 100ms"));
        Ok(())
    });

    Promise::race(&event_loop.scheduler(), vec![slow.into(), timeout.into()]).then(
        Some(transcript.reaction("race won: ")),
        Some(transcript.reaction("race lost: ")),
    );
}

fn combinators(event_loop: &EventLoop, transcript: &Transcript) {
    let scheduler = event_loop.scheduler();

    let (third, resolve_third) = event_loop.with_resolvers();
    event_loop.set_timeout(10, move || {
        resolve_third.resolve(3);
        Ok(())
    });
    Promise::all(
        &scheduler,
        vec![Value::Smi(1), event_loop.resolve(2).into(), third.into()],
    )
    .then(Some(transcript.reaction("all: ")), None);

    let t = transcript.clone();
    Promise::all_settled(
        &scheduler,
        vec![event_loop.resolve("ok").into(), event_loop.reject("no").into()],
    )
    .then(
        Some(Function::new(move |records| {
            let statuses: Vec<String> = match &records {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|record| record.get("status"))
                    .map(|status| status.to_string())
                    .collect(),
                _ => Vec::new(),
            };
            t.log(format!("allSettled: {}", statuses.join(",")));
            Ok(Value::Undefined)
        })),
        None,
    );

    let t = transcript.clone();
    Promise::any(
        &scheduler,
        vec![event_loop.reject("a").into(), event_loop.reject("b").into()],
    )
    .catch(Function::new(move |reason| {
        let count = reason.as_error().map_or(0, |error| error.errors.len());
        t.log(format!("any: {reason} ({count} errors)"));
        Ok(Value::Undefined)
    }));
}
