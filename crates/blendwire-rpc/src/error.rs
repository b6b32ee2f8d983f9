//! Error surface of the RPC client.
//!
//! Transport failures are split so callers can tell "is the server even
//! running" apart from "the server rejected this request".

use thiserror::Error;

/// Errors raised while talking to the automation server.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The configured base URL could not be parsed.
    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        /// Offending value.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    BuildClient(#[source] reqwest::Error),
    /// The server could not be reached (refused, unreachable, DNS).
    #[error("could not connect to {url}: {source}")]
    Connect {
        /// Endpoint that was being contacted.
        url: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("HTTP {code}: {reason}")]
    Status {
        /// Numeric status code.
        code: u16,
        /// Canonical reason phrase, empty when the code has none.
        reason: String,
    },
    /// The request exceeded its timeout.
    #[error("request to {url} timed out: {source}")]
    Timeout {
        /// Endpoint that was being contacted.
        url: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// Any other transport failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Endpoint that was being contacted.
        url: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The response body was not the JSON object the protocol promises.
    #[error("malformed response from {url}: {message}")]
    Decode {
        /// Endpoint that produced the body.
        url: String,
        /// Description of the mismatch.
        message: String,
    },
}

impl RpcError {
    /// Returns true for failures that mean "not ready yet" rather than a
    /// protocol mismatch.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Status { .. } | Self::Timeout { .. }
        )
    }

    /// Returns true when the server could not be reached at all.
    #[must_use]
    pub const fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    pub(crate) fn from_transport(url: &str, source: reqwest::Error) -> Self {
        let endpoint = url.to_owned();
        if source.is_connect() {
            Self::Connect {
                url: endpoint,
                source,
            }
        } else if source.is_timeout() {
            Self::Timeout {
                url: endpoint,
                source,
            }
        } else {
            Self::Transport {
                url: endpoint,
                source,
            }
        }
    }
}
