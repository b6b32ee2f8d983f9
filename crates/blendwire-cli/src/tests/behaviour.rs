//! BDD step definitions for CLI behaviour.
//!
//! These steps map scenarios in `tests/features/blendwire_cli.feature` onto
//! runs of the CLI against a fake automation server.

use super::support::*;

use std::cell::RefCell;

use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}

/// Reads a step value as JSON, falling back to a plain string.
fn step_value(text: &str) -> Value {
    let text = unquote(text);
    serde_json::from_str(text).unwrap_or_else(|_| json!(text))
}

#[given("a fake host reporting healthy")]
fn given_healthy_host(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_host(vec![Canned::ok(&json!({ "healthy": true, "version": "4.2" }))])
        .expect("start fake host");
}

#[given("a fake host accepting commands")]
fn given_accepting_host(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_host(vec![Canned::ok(&json!({ "success": true, "result": "done" }))])
        .expect("start fake host");
}

#[given("a fake host rejecting commands")]
fn given_rejecting_host(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_host(vec![Canned::ok(
            &json!({ "success": false, "error": "object 'Ghost' not found" }),
        )])
        .expect("start fake host");
}

#[given("a fake host failing with status {status}")]
fn given_failing_host(world: &RefCell<TestWorld>, status: u16) {
    let reason = match status {
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Error",
    };
    world
        .borrow_mut()
        .start_host(vec![Canned::status(status, reason)])
        .expect("start fake host");
}

#[given("an unreachable host")]
fn given_unreachable_host(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .use_unreachable_host()
        .expect("reserve closed port");
}

#[given("an empty project directory")]
fn given_empty_project(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .use_empty_project()
        .expect("create project root");
}

#[when("the operator runs {command}")]
fn when_operator_runs(world: &RefCell<TestWorld>, command: String) {
    world.borrow_mut().run(&command);
}

#[then("the envelope reports success")]
fn then_envelope_ok(world: &RefCell<TestWorld>) {
    let envelope = world.borrow().envelope().expect("parse envelope");
    assert_eq!(envelope.get("ok"), Some(&Value::Bool(true)), "{envelope}");
}

#[then("the envelope reports an error containing {snippet}")]
fn then_envelope_error(world: &RefCell<TestWorld>, snippet: String) {
    let envelope = world.borrow().envelope().expect("parse envelope");
    assert_eq!(envelope.get("ok"), Some(&Value::Bool(false)), "{envelope}");
    let error = envelope
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let snippet = unquote(&snippet);
    assert!(
        error.contains(snippet),
        "error {error:?} did not contain {snippet:?}"
    );
}

#[then("the envelope field {field} is {expected}")]
fn then_envelope_field(world: &RefCell<TestWorld>, field: String, expected: String) {
    let envelope = world.borrow().envelope().expect("parse envelope");
    assert_eq!(
        envelope.get(unquote(&field)),
        Some(&step_value(&expected)),
        "{envelope}"
    );
}

#[then("the host receives action {action} with {param} set to {value}")]
fn then_host_receives(world: &RefCell<TestWorld>, action: String, param: String, value: String) {
    let requests = world.borrow().requests();
    assert_eq!(requests.len(), 1, "expected a single request");
    let request = requests.first().expect("recorded request");
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/command");
    let body = request.json().expect("request json");
    assert_eq!(body.get("action"), Some(&json!(unquote(&action))));
    assert_eq!(
        body.get("params").and_then(|params| params.get(unquote(&param))),
        Some(&step_value(&value)),
        "{body}"
    );
}

#[then("stderr contains {snippet}")]
fn then_stderr_contains(world: &RefCell<TestWorld>, snippet: String) {
    let stderr = world.borrow().stderr_text().expect("stderr text");
    let snippet = unquote(&snippet);
    assert!(
        stderr.contains(snippet),
        "stderr {stderr:?} did not contain {snippet:?}"
    );
}

#[then("stdout is empty")]
fn then_stdout_empty(world: &RefCell<TestWorld>) {
    let stdout = world.borrow().stdout_text().expect("stdout text");
    assert!(stdout.is_empty(), "stdout was {stdout:?}");
}

#[then("the CLI exits with code {status}")]
fn then_exit_code(world: &RefCell<TestWorld>, status: u8) {
    world
        .borrow()
        .assert_exit_code(status)
        .expect("exit code matches");
}

#[scenario(path = "tests/features/blendwire_cli.feature")]
fn blendwire_cli_behaviour(world: RefCell<TestWorld>) {
    let _ = world;
}
