//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use blendwire_config::ConfigError;
use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[source] ConfigError),
    #[error("command registration failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to serialise response envelope: {0}")]
    SerialiseEnvelope(serde_json::Error),
    #[error("failed to emit response envelope: {0}")]
    EmitEnvelope(io::Error),
}
