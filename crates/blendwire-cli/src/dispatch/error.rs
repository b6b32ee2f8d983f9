//! Failures raised by command bodies.

use blendwire_rpc::RpcError;
use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// Error returned from a command body; the dispatcher folds it into the
/// response envelope.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Talking to the automation server failed.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// Managing the host process failed unexpectedly.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// A bound argument had the wrong shape.
    #[error("argument '{name}' must be {expected}")]
    Argument {
        /// Parameter name.
        name: String,
        /// Human description of the accepted values.
        expected: &'static str,
    },
}

impl CommandError {
    pub(crate) fn argument(name: &str, expected: &'static str) -> Self {
        Self::Argument {
            name: name.to_owned(),
            expected,
        }
    }
}
