//! Shared configuration for the blendwire CLI.
//!
//! [`Config`] is assembled by `ortho_config`: built-in defaults, then an
//! optional `.blendwire.toml`, then `BLENDWIRE_*` environment variables, then
//! command-line flags. [`Config::validated`] applies the checks the loader
//! cannot express. The crate also owns the runtime artefact layout and the
//! host executable resolution chain so every lifecycle command agrees on
//! where things live.

use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub mod defaults;
mod executable;
mod logging;
mod runtime;

pub use defaults::{
    DEFAULT_BASE_URL, DEFAULT_LOG_FILTER, default_base_url, default_log_filter,
    default_log_filter_string, default_log_format, default_project_root,
};
pub use executable::{ExecutableError, ExecutableResolver, ExecutableSource, ResolvedExecutable};
pub use logging::LogFormat;
pub use runtime::{RuntimePaths, RuntimePathsError};

/// Resolved configuration for one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "BLENDWIRE")]
pub struct Config {
    /// Base URL of the host's automation server.
    #[ortho_config(default = default_base_url())]
    pub base_url: String,
    /// `tracing` filter expression applied to diagnostics on stderr.
    #[ortho_config(default = default_log_filter_string(), cli_short = 'l')]
    pub log_filter: String,
    /// Rendering of diagnostics on stderr.
    #[ortho_config(default = default_log_format(), cli_short = 'F')]
    pub log_format: LogFormat,
    /// Directory holding the runtime state and local config files.
    #[ortho_config(default = default_project_root(), cli_short = 'r')]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            project_root: default_project_root(),
        }
    }
}

/// Values the layered loader accepted but the CLI cannot use.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL did not parse.
    #[error("invalid base URL '{value}': {source}")]
    InvalidBaseUrl {
        /// Offending value.
        value: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The base URL parsed but does not speak HTTP.
    #[error("base URL '{value}' must use http or https")]
    UnsupportedScheme {
        /// Offending value.
        value: String,
    },
}

impl Config {
    /// Checks the base URL and strips its trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the base URL does not parse or names a
    /// scheme other than `http` or `https`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let base_url = normalise_base_url(&self.base_url)?;
        Ok(Self { base_url, ..self })
    }

    /// Base URL of the automation server.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Project root directory.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Runtime artefact paths beneath the project root.
    #[must_use]
    pub fn runtime_paths(&self) -> RuntimePaths {
        RuntimePaths::from_root(&self.project_root)
    }

    /// Executable resolver bound to the project root and process environment.
    #[must_use]
    pub fn executable_resolver(&self) -> ExecutableResolver {
        ExecutableResolver::new(&self.project_root)
    }
}

fn normalise_base_url(value: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(value).map_err(|source| ConfigError::InvalidBaseUrl {
        value: value.to_owned(),
        source,
    })?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(value.trim_end_matches('/').to_owned())
    } else {
        Err(ConfigError::UnsupportedScheme {
            value: value.to_owned(),
        })
    }
}
