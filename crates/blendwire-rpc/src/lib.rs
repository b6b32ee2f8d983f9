//! Minimal RPC client for the host's in-process automation server.
//!
//! Two request shapes travel over one HTTP transport: `POST <base>/command`
//! carrying an `{action, params}` envelope, and `GET <base>/health` used for
//! liveness polling. [`RpcClient::ping_with_backoff`] layers a bounded
//! exponential backoff over the health check.

mod backoff;
mod client;
mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use backoff::Backoff;
pub use client::{
    COMMAND_PATH, COMMAND_TIMEOUT, CommandRequest, HEALTH_PATH, HEALTH_TIMEOUT, RpcClient,
    is_healthy,
};
pub use error::RpcError;
