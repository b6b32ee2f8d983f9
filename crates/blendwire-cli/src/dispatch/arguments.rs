//! Bound command arguments.

use serde_json::{Map, Value};

use super::CommandError;

/// Parameter values keyed by parameter name, one entry per declared
/// parameter. Omitted flags carry their declared default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    /// Wraps an existing map.
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Sets a value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Text value of a mandatory parameter.
    pub fn string(&self, name: &str) -> Result<&str, CommandError> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| CommandError::argument(name, "a string"))
    }

    /// Text value of a parameter that may be null.
    pub fn optional_string(&self, name: &str) -> Result<Option<&str>, CommandError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text)),
            Some(_) => Err(CommandError::argument(name, "a string or null")),
        }
    }

    /// Integer value.
    pub fn integer(&self, name: &str) -> Result<i64, CommandError> {
        self.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| CommandError::argument(name, "an integer"))
    }

    /// Float value; integers are widened.
    pub fn float(&self, name: &str) -> Result<f64, CommandError> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| CommandError::argument(name, "a number"))
    }

    /// Boolean value.
    pub fn boolean(&self, name: &str) -> Result<bool, CommandError> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| CommandError::argument(name, "a boolean"))
    }

    /// All values as a JSON object, for forwarding to the server.
    pub fn to_params(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
