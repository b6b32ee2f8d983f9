//! Configuration loading for the CLI.
//!
//! The dispatcher hands the loader only the top-level configuration flags
//! clap has already recognised, rebuilt as an argument list, so
//! `ortho_config` never sees subcommand tokens.

use std::ffi::OsString;

use blendwire_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from `args`, the binary name followed by the
    /// configuration flags, layered over files and the environment.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

/// Loads through `ortho_config`, then validates the result.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned())
            .map_err(AppError::LoadConfiguration)?
            .validated()
            .map_err(AppError::InvalidConfiguration)
    }
}
