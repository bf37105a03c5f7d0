//! End-to-End CLI Integration Tests
//!
//! Drives the promise_cli library the way the `corten-promise` binary does:
//! parse arguments, execute, inspect what was written.

use clap::Parser as ClapParser;
use promise_cli::{execute, scenarios, Cli, CliError};

fn run(args: &[&str]) -> (Result<(), CliError>, String) {
    let cli = Cli::try_parse_from(args).expect("arguments should parse");
    let mut out = Vec::new();
    let result = execute(&cli, &mut out);
    (result, String::from_utf8(out).expect("output is UTF-8"))
}

/// Test: every catalogued scenario passes --check
#[test]
fn test_e2e_check_all() {
    let (result, out) = run(&["corten-promise", "run", "--all", "--check"]);
    assert!(result.is_ok(), "{:?}", result);
    assert_eq!(out.matches("== ").count(), scenarios::all().len());
    assert!(!out.contains("expected:"));
}

/// Test: transcript printed for a timer-driven scenario
#[test]
fn test_e2e_timeout_race_output() {
    let (result, out) = run(&["corten-promise", "run", "timeout-race"]);
    assert!(result.is_ok());
    assert_eq!(
        out,
        "== timeout-race (t=500ms)\n  race lost: Error: timed out after 100ms\n  slow operation finished\n"
    );
}

/// Test: scenarios run in the order given
#[test]
fn test_e2e_run_order_follows_arguments() {
    let (result, out) = run(&["corten-promise", "run", "finally", "ordering"]);
    assert!(result.is_ok());
    let finally_at = out.find("== finally").unwrap();
    let ordering_at = out.find("== ordering").unwrap();
    assert!(finally_at < ordering_at);
}

/// Test: a tight microtask limit surfaces as a runtime error
#[test]
fn test_e2e_microtask_limit_error() {
    let (result, _) = run(&["corten-promise", "--microtask-limit", "2", "run", "chaining"]);
    match result {
        Err(CliError::Runtime(e)) => {
            assert_eq!(e.to_string(), "microtask checkpoint exceeded 2 jobs")
        }
        other => panic!("expected runtime error, got {:?}", other),
    }
}

/// Test: an unknown scenario fails before anything runs
#[test]
fn test_e2e_unknown_scenario() {
    let (result, out) = run(&["corten-promise", "run", "ordering", "missing"]);
    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown scenario 'missing' (run `corten-promise list`)"
    );
    assert!(out.is_empty());
}
