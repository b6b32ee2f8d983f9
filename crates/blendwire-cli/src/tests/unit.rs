//! Runtime tests that drive `run_with_loader` directly.

use super::support::*;

use std::cell::RefCell;

use rstest::rstest;
use serde_json::{Value, json};

#[rstest]
fn help_goes_to_stdout_and_succeeds(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run("--help");
    world.assert_exit_code(0).expect("exit code");
    let stdout = world.stdout_text().expect("stdout");
    assert!(stdout.contains("render-viewport"), "{stdout}");
    assert!(stdout.contains("--base-url"), "{stdout}");
}

#[rstest]
fn subcommand_help_lists_parameter_docs(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run("get-mesh-metrics --help");
    world.assert_exit_code(0).expect("exit code");
    let stdout = world.stdout_text().expect("stdout");
    assert!(stdout.contains("--no-watertight"), "{stdout}");
    assert!(stdout.contains("-o, --object-name"), "{stdout}");
}

#[rstest]
fn bare_invocation_prints_help_and_fails(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run("");
    world.assert_exit_code(2).expect("exit code");
    assert!(world.stdout.is_empty());
    let stderr = world.stderr_text().expect("stderr");
    assert!(stderr.contains("Usage"), "{stderr}");
}

#[rstest]
fn unknown_commands_are_usage_errors(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run("explode");
    world.assert_exit_code(2).expect("exit code");
    assert!(world.stdout.is_empty());
    let stderr = world.stderr_text().expect("stderr");
    assert!(stderr.contains("explode"), "{stderr}");
}

#[rstest]
fn invalid_base_url_is_reported_in_the_envelope(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run_configured("--base-url ftp://127.0.0.1 health");
    world.assert_exit_code(2).expect("exit code");
    let envelope = world.envelope().expect("envelope");
    assert_eq!(envelope.get("ok"), Some(&json!(false)));
    let error = envelope.get("error").and_then(Value::as_str).unwrap_or_default();
    assert!(error.contains("must use http or https"), "{error}");
}

#[rstest]
fn base_url_flag_overrides_loaded_config(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    let host = FakeHost::spawn(vec![Canned::ok(&json!({ "healthy": true }))]).expect("host");
    world.run_configured(&format!("--base-url {} health", host.base_url()));
    world.assert_exit_code(0).expect("exit code");
    assert_eq!(host.requests().len(), 1);
}

#[rstest]
fn config_file_supplies_the_base_url(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    let host = FakeHost::spawn(vec![Canned::ok(&json!({ "healthy": true }))]).expect("host");
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("blendwire.toml");
    std::fs::write(&path, format!("base_url = \"{}\"\n", host.base_url())).expect("write config");
    world.run_configured(&format!("--config-path {} health", path.display()));
    world.assert_exit_code(0).expect("exit code");
    assert_eq!(host.requests().len(), 1);
}

#[rstest]
fn list_commands_describes_the_registry(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.run("list-commands");
    world.assert_exit_code(0).expect("exit code");
    let envelope = world.envelope().expect("envelope");
    let commands = envelope
        .get("commands")
        .and_then(Value::as_array)
        .expect("command list");
    let names: Vec<&str> = commands
        .iter()
        .filter_map(|command| command.get("name").and_then(Value::as_str))
        .collect();
    assert!(names.contains(&"get-mesh-metrics"), "{names:?}");
    assert!(names.contains(&"list-commands"), "{names:?}");
    let ping = commands
        .iter()
        .find(|command| command.get("name") == Some(&json!("ping")))
        .expect("ping listed");
    assert_eq!(ping.get("needs_client"), Some(&json!(true)));
}

#[rstest]
fn status_without_a_host_reports_nothing_tracked(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.use_empty_project().expect("project root");
    world.use_unreachable_host().expect("closed port");
    world.run("status");
    world.assert_exit_code(0).expect("exit code");
    let envelope = world.envelope().expect("envelope");
    assert_eq!(envelope.get("pid"), Some(&Value::Null));
    assert_eq!(envelope.get("healthy"), Some(&json!(false)));
}

#[rstest]
fn ping_rejects_negative_delays(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.use_unreachable_host().expect("closed port");
    world.run("ping --attempts 1 --base-delay -1");
    world.assert_exit_code(2).expect("exit code");
    let envelope = world.envelope().expect("envelope");
    let error = envelope.get("error").and_then(Value::as_str).unwrap_or_default();
    assert!(error.contains("argument 'base_delay'"), "{error}");
}

#[rstest]
fn ping_gives_up_after_its_attempts(world: RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    world.use_unreachable_host().expect("closed port");
    world.run("ping --attempts 2 --base-delay 0");
    world.assert_exit_code(2).expect("exit code");
    let envelope = world.envelope().expect("envelope");
    assert_eq!(envelope.get("healthy"), Some(&json!(false)));
    let error = envelope.get("error").and_then(Value::as_str).unwrap_or_default();
    assert!(error.contains("after 2 attempts"), "{error}");
}
