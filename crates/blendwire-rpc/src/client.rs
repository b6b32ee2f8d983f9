//! HTTP transport for the automation server.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::backoff::Backoff;
use crate::error::RpcError;

/// Path of the command endpoint, relative to the base URL.
pub const COMMAND_PATH: &str = "command";

/// Path of the health endpoint, relative to the base URL.
pub const HEALTH_PATH: &str = "health";

/// Timeout for command requests; remote actions such as renders are slow.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for health checks.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of a `POST <base>/command` request.
#[derive(Debug, Serialize)]
pub struct CommandRequest<'a> {
    /// Name of the remote action.
    pub action: &'a str,
    /// Action parameters.
    pub params: &'a Value,
}

/// Blocking client bound to one automation server.
#[derive(Debug, Clone)]
pub struct RpcClient {
    base_url: String,
    command_url: String,
    health_url: String,
    command_timeout: Duration,
    health_timeout: Duration,
    http: Client,
}

impl RpcClient {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidBaseUrl`] when the URL does not parse and
    /// [`RpcError::BuildClient`] when the HTTP stack cannot be initialised.
    pub fn new(base_url: &str) -> Result<Self, RpcError> {
        let parsed = Url::parse(base_url).map_err(|source| RpcError::InvalidBaseUrl {
            url: base_url.to_owned(),
            source,
        })?;
        let base = parsed.as_str().trim_end_matches('/').to_owned();
        let http = Client::builder().build().map_err(RpcError::BuildClient)?;
        Ok(Self {
            command_url: format!("{base}/{COMMAND_PATH}"),
            health_url: format!("{base}/{HEALTH_PATH}"),
            base_url: base,
            command_timeout: COMMAND_TIMEOUT,
            health_timeout: HEALTH_TIMEOUT,
            http,
        })
    }

    /// Overrides the command timeout.
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Overrides the health check timeout.
    #[must_use]
    pub const fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `{action, params}` to the command endpoint.
    ///
    /// # Errors
    ///
    /// Transport failures surface as [`RpcError::Connect`],
    /// [`RpcError::Timeout`] or [`RpcError::Transport`]; non-success statuses
    /// as [`RpcError::Status`]; a body that is not a JSON object as
    /// [`RpcError::Decode`].
    pub fn command(&self, action: &str, params: &Value) -> Result<Value, RpcError> {
        debug!(action, url = %self.command_url, "sending command");
        let request = CommandRequest { action, params };
        let response = self
            .http
            .post(&self.command_url)
            .json(&request)
            .timeout(self.command_timeout)
            .send()
            .map_err(|source| RpcError::from_transport(&self.command_url, source))?;
        decode(&self.command_url, response)
    }

    /// Fetches the health endpoint.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`RpcClient::command`].
    pub fn health(&self) -> Result<Value, RpcError> {
        let response = self
            .http
            .get(&self.health_url)
            .timeout(self.health_timeout)
            .send()
            .map_err(|source| RpcError::from_transport(&self.health_url, source))?;
        decode(&self.health_url, response)
    }

    /// Polls [`RpcClient::health`] until it reports healthy.
    ///
    /// Sleeps `base_delay * 2^attempt` between attempts. Unreachable servers,
    /// error statuses, timeouts, and a falsy `healthy` field all count as one
    /// failed attempt. Returns `Ok(false)` once the budget is spent.
    ///
    /// # Errors
    ///
    /// Only non-transient failures, such as a malformed body on a successful
    /// status, propagate; they indicate a protocol mismatch.
    pub fn ping_with_backoff(
        &self,
        max_attempts: u32,
        base_delay: Duration,
    ) -> Result<bool, RpcError> {
        Backoff::new(max_attempts, base_delay).poll(|attempt| self.check_once(attempt), thread::sleep)
    }

    fn check_once(&self, attempt: u32) -> Result<bool, RpcError> {
        match self.health() {
            Ok(body) => {
                let healthy = is_healthy(&body);
                debug!(attempt, healthy, "health check answered");
                Ok(healthy)
            }
            Err(error) if error.is_transient() => {
                debug!(attempt, %error, "health check failed; server not ready");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }
}

/// Reads the `healthy` flag from a health response.
#[must_use]
pub fn is_healthy(body: &Value) -> bool {
    body.get("healthy").and_then(Value::as_bool).unwrap_or(false)
}

fn decode(url: &str, response: Response) -> Result<Value, RpcError> {
    let status = response.status();
    if !status.is_success() {
        return Err(RpcError::Status {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
        });
    }
    let body = response
        .text()
        .map_err(|source| RpcError::from_transport(url, source))?;
    let value: Value = serde_json::from_str(&body).map_err(|error| RpcError::Decode {
        url: url.to_owned(),
        message: error.to_string(),
    })?;
    if !value.is_object() {
        return Err(RpcError::Decode {
            url: url.to_owned(),
            message: String::from("expected a JSON object"),
        });
    }
    Ok(value)
}
