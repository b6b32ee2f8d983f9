//! An in-process stand-in for the host's automation server.
//!
//! [`FakeHost`] serves one canned HTTP response per accepted connection and
//! records each request so tests can assert on what the client sent. Enabled
//! for this crate's own tests and, through the `test-support` feature, for
//! dependants.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use serde_json::Value;

/// A request as seen by the fake host.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method, e.g. `POST`.
    pub method: String,
    /// Request target, e.g. `/command`.
    pub path: String,
    /// Raw body text; empty for `GET`.
    pub body: String,
}

impl RecordedRequest {
    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Fails when the body is not valid JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_str(&self.body).context("request body is not JSON")
    }
}

/// One canned HTTP response.
#[derive(Debug, Clone)]
pub struct Canned {
    status: u16,
    reason: &'static str,
    body: String,
}

impl Canned {
    /// `200 OK` carrying `body`.
    #[must_use]
    pub fn ok(body: &Value) -> Self {
        Self::raw(200, "OK", &body.to_string())
    }

    /// An empty JSON object under an arbitrary status.
    #[must_use]
    pub fn status(status: u16, reason: &'static str) -> Self {
        Self::raw(status, reason, "{}")
    }

    /// Any status with a verbatim body, JSON or not.
    #[must_use]
    pub fn raw(status: u16, reason: &'static str, body: &str) -> Self {
        Self {
            status,
            reason,
            body: body.to_owned(),
        }
    }
}

/// Loopback server answering with canned responses in order.
#[derive(Debug)]
pub struct FakeHost {
    port: u16,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeHost {
    /// Binds an ephemeral port and serves `responses` in order, one per
    /// connection. The serving thread exits after the last response.
    ///
    /// # Errors
    ///
    /// Fails when no loopback port can be bound.
    pub fn spawn(responses: Vec<Canned>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake host")?;
        let port = listener.local_addr().context("local addr")?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for response in responses {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                if serve(stream, &response, &recorded).is_err() {
                    return;
                }
            }
        });
        Ok(Self { port, requests })
    }

    /// Base URL pointing at this server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// A base URL whose port was just released, so connections are refused.
///
/// # Errors
///
/// Fails when no loopback port can be bound.
pub fn unreachable_base_url() -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind loopback listener")?;
    let port = listener.local_addr().context("local addr")?.port();
    drop(listener);
    Ok(format!("http://127.0.0.1:{port}"))
}

fn serve(
    stream: TcpStream,
    response: &Canned,
    recorded: &Arc<Mutex<Vec<RecordedRequest>>>,
) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();
    let mut content_length = 0_usize;
    loop {
        let mut raw_header = String::new();
        reader.read_line(&mut raw_header)?;
        let header = raw_header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse()?;
        }
    }
    let mut body = vec![0_u8; content_length];
    reader.read_exact(&mut body)?;
    if let Ok(mut guard) = recorded.lock() {
        guard.push(RecordedRequest {
            method,
            path,
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    let mut writer = stream;
    write!(
        writer,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.reason,
        response.body.len(),
        response.body
    )?;
    writer.flush()?;
    Ok(())
}
