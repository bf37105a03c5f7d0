//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, JsResult, Value};

#[test]
fn test_display_includes_kind_and_message() {
    let error = JsError::new(ErrorKind::TypeError, "not a thenable");
    assert_eq!(error.to_string(), "TypeError: not a thenable");
}

#[test]
fn test_plain_error_shorthand() {
    let error = JsError::error("boom");
    assert_eq!(error.kind, ErrorKind::Error);
    assert_eq!(error.to_string(), "Error: boom");
}

#[test]
fn test_error_is_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    takes_error(&JsError::type_error("x"));
}

#[test]
fn test_question_mark_converts_into_thrown_value() {
    fn fails() -> Result<(), JsError> {
        Err(JsError::type_error("nope"))
    }
    fn wrapper() -> JsResult<()> {
        fails()?;
        Ok(())
    }

    let thrown = wrapper().unwrap_err();
    assert_eq!(thrown.as_error().map(|e| e.kind), Some(ErrorKind::TypeError));
}

#[test]
fn test_aggregate_error_display() {
    let error = JsError::aggregate("All promises were rejected", vec![Value::from("a")]);
    assert_eq!(error.to_string(), "AggregateError: All promises were rejected");
    assert_eq!(error.errors, vec![Value::from("a")]);
}
