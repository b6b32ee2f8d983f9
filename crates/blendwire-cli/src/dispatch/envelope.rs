//! The JSON object written to stdout for every dispatched command.

use std::any::Any;
use std::error::Error;
use std::iter;
use std::process::ExitCode;

use blendwire_rpc::RpcError;
use serde::Serialize;
use serde_json::{Map, Value};

use super::CommandError;

/// Exit status for any envelope whose `ok` is false.
pub const FAILURE_EXIT: u8 = 2;

const OK_KEY: &str = "ok";
/// Verdict key used by the automation server in place of `ok`.
const SUCCESS_KEY: &str = "success";
const ERROR_KEY: &str = "error";
const TRACEBACK_KEY: &str = "traceback";

/// Response envelope. Always an object with a boolean `ok`; failures also
/// carry an `error` string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    /// `{"ok": true}`.
    #[must_use]
    pub fn success() -> Self {
        let mut fields = Map::new();
        fields.insert(OK_KEY.to_owned(), Value::Bool(true));
        Self(fields)
    }

    /// `{"ok": false, "error": <error>}`.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::success().failed(error)
    }

    /// Builds an envelope from an explicit verdict plus extra fields.
    #[must_use]
    pub fn from_fields(ok: bool, fields: Map<String, Value>) -> Self {
        let mut envelope = Self(fields);
        envelope.insert(OK_KEY, Value::Bool(ok));
        envelope
    }

    /// Adds a field.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Marks the envelope failed with `error`, keeping other fields.
    #[must_use]
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.0.insert(OK_KEY.to_owned(), Value::Bool(false));
        self.0
            .insert(ERROR_KEY.to_owned(), Value::String(error.into()));
        self
    }

    /// Adds `error` to a failed envelope that has none yet.
    #[must_use]
    pub fn or_error(self, error: impl Into<String>) -> Self {
        if self.ok() || self.error().is_some() {
            self
        } else {
            self.failed(error)
        }
    }

    /// Sets a field. Writing `ok` stores the truthiness of `value`.
    pub fn insert(&mut self, key: &str, value: Value) {
        let stored = if key == OK_KEY {
            Value::Bool(truthy(&value))
        } else {
            value
        };
        self.0.insert(key.to_owned(), stored);
    }

    /// Reads a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Success flag.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.0.get(OK_KEY).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Error text, when present.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.0.get(ERROR_KEY).and_then(Value::as_str)
    }

    /// Normalises whatever a command body returned.
    ///
    /// Objects keep their fields with `ok` coerced to a boolean. An object
    /// without `ok`, or any non-object, becomes a failure.
    #[must_use]
    pub fn from_result(value: Value) -> Self {
        match value {
            Value::Object(mut fields) => {
                let Some(verdict) = fields.remove(OK_KEY) else {
                    let envelope = Self(fields);
                    return if envelope.error().is_some() {
                        envelope.with(OK_KEY, false)
                    } else {
                        envelope.failed("command result did not include an 'ok' field")
                    };
                };
                Self::from_fields(truthy(&verdict), fields)
            }
            other => Self::failure("command returned a non-object result").with("result", other),
        }
    }

    /// Maps a reply to `action` from the automation server onto an envelope.
    ///
    /// The server reports its verdict as `success`; that field becomes `ok`
    /// and the remaining fields are kept. A reply without a verdict, or one
    /// that is not an object, is a failure.
    #[must_use]
    pub fn from_host_reply(action: &str, reply: Value) -> Self {
        match reply {
            Value::Object(mut fields) => {
                let success = fields.remove(SUCCESS_KEY);
                let legacy = fields.remove(OK_KEY);
                let ok = success.or(legacy).is_some_and(|verdict| truthy(&verdict));
                Self::from_fields(ok, fields).or_error(format!("remote action '{action}' failed"))
            }
            other => Self::failure(format!(
                "remote action '{action}' returned a non-object response"
            ))
            .with("response", other),
        }
    }

    /// Maps a command failure onto the three error tiers: unreachable
    /// server, HTTP status, and everything else with a cause chain.
    #[must_use]
    pub fn from_error(error: &CommandError) -> Self {
        match error {
            CommandError::Rpc(rpc) if rpc.is_connect() => {
                Self::failure(format!("Connection error: {rpc}"))
            }
            CommandError::Rpc(rpc @ RpcError::Status { .. }) => Self::failure(rpc.to_string()),
            other => Self::failure(other.to_string()).with(TRACEBACK_KEY, traceback(other)),
        }
    }

    /// Failure envelope for a command body that panicked.
    #[must_use]
    pub fn from_panic(command: &str, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("non-string panic payload"));
        Self::failure(format!("command '{command}' panicked: {message}")).with(
            TRACEBACK_KEY,
            vec![format!("panic in command '{command}': {message}")],
        )
    }

    /// `0` for success, [`FAILURE_EXIT`] otherwise.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(FAILURE_EXIT)
        }
    }

    /// Unwraps into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Loose truthiness: null, false, zero, and empty containers are false.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|float| float.abs() > 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn traceback(error: &dyn Error) -> Vec<String> {
    iter::successors(Some(error), |&current| current.source())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::bool_kept(json!({ "ok": true, "pid": 7 }), true)]
    #[case::false_kept(json!({ "ok": false, "error": "boom" }), false)]
    #[case::truthy_number(json!({ "ok": 1 }), true)]
    #[case::empty_string(json!({ "ok": "" }), false)]
    fn object_results_keep_a_boolean_ok(#[case] value: Value, #[case] expected: bool) {
        let envelope = Envelope::from_result(value);
        assert_eq!(envelope.get("ok"), Some(&Value::Bool(expected)));
    }

    #[rstest]
    fn object_without_ok_becomes_failure() {
        let envelope = Envelope::from_result(json!({ "pid": 3 }));
        assert!(!envelope.ok());
        assert_eq!(envelope.get("pid"), Some(&json!(3)));
        assert!(envelope.error().is_some_and(|error| error.contains("'ok'")));
    }

    #[rstest]
    fn object_without_ok_keeps_its_error() {
        let envelope = Envelope::from_result(json!({ "error": "render failed" }));
        assert!(!envelope.ok());
        assert_eq!(envelope.error(), Some("render failed"));
    }

    #[rstest]
    #[case::string(json!("done"))]
    #[case::null(Value::Null)]
    #[case::array(json!([1, 2]))]
    fn non_object_results_become_failures(#[case] value: Value) {
        let envelope = Envelope::from_result(value.clone());
        assert!(!envelope.ok());
        assert_eq!(envelope.get("result"), Some(&value));
    }

    #[rstest]
    fn host_success_becomes_ok() {
        let envelope = Envelope::from_host_reply(
            "get_mesh_metrics",
            json!({ "success": true, "vertices": 8, "watertight": true }),
        );
        assert!(envelope.ok());
        assert_eq!(envelope.get("vertices"), Some(&json!(8)));
        assert!(envelope.get("success").is_none());
    }

    #[rstest]
    fn host_failure_keeps_the_host_error() {
        let envelope = Envelope::from_host_reply(
            "apply_node_group",
            json!({ "success": false, "error": "node group 'Scatter' not found" }),
        );
        assert!(!envelope.ok());
        assert_eq!(envelope.error(), Some("node group 'Scatter' not found"));
    }

    #[rstest]
    fn host_reply_without_verdict_names_the_action() {
        let envelope = Envelope::from_host_reply("render_viewport", json!({ "path": "/tmp/a.png" }));
        assert!(!envelope.ok());
        assert_eq!(envelope.error(), Some("remote action 'render_viewport' failed"));
    }

    #[rstest]
    fn non_object_host_replies_are_wrapped() {
        let envelope = Envelope::from_host_reply("execute", json!(["unexpected"]));
        assert!(!envelope.ok());
        assert_eq!(envelope.get("response"), Some(&json!(["unexpected"])));
        assert!(envelope.get("ok").is_some_and(Value::is_boolean));
    }

    #[rstest]
    fn status_errors_render_code_and_reason() {
        let error = CommandError::from(RpcError::Status {
            code: 500,
            reason: String::from("Internal Server Error"),
        });
        let envelope = Envelope::from_error(&error);
        assert_eq!(envelope.error(), Some("HTTP 500: Internal Server Error"));
        assert!(envelope.get("traceback").is_none());
    }

    #[rstest]
    fn other_errors_carry_a_traceback() {
        let error = CommandError::argument("width", "an integer");
        let envelope = Envelope::from_error(&error);
        assert_eq!(envelope.error(), Some("argument 'width' must be an integer"));
        assert_eq!(
            envelope.get("traceback"),
            Some(&json!(["argument 'width' must be an integer"]))
        );
    }

    #[rstest]
    fn panics_are_reported_with_the_command_name() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        let envelope = Envelope::from_panic("render-viewport", payload.as_ref());
        assert!(!envelope.ok());
        assert_eq!(
            envelope.error(),
            Some("command 'render-viewport' panicked: index out of bounds")
        );
    }

    #[rstest]
    fn or_error_only_fills_missing_errors() {
        let bare = Envelope::from_fields(false, Map::new()).or_error("fallback");
        let explained = Envelope::failure("specific").or_error("fallback");
        let passed = Envelope::success().or_error("fallback");

        assert_eq!(bare.error(), Some("fallback"));
        assert_eq!(explained.error(), Some("specific"));
        assert_eq!(passed.error(), None);
    }

    #[rstest]
    fn inserting_ok_coerces_to_bool() {
        let envelope = Envelope::success().with("ok", json!("yes"));
        assert_eq!(envelope.get("ok"), Some(&Value::Bool(true)));
    }

    #[rstest]
    #[case(Envelope::success(), ExitCode::SUCCESS)]
    #[case(Envelope::failure("nope"), ExitCode::from(FAILURE_EXIT))]
    fn exit_code_follows_ok(#[case] envelope: Envelope, #[case] expected: ExitCode) {
        assert_eq!(envelope.exit_code(), expected);
    }
}
