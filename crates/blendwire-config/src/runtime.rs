//! Derives runtime artefact paths for the supervised host process.
//!
//! The state directory houses the PID record and the host log. Every lifecycle
//! command resolves the same layout so a `shutdown` issued from a later CLI
//! invocation finds the PID written by an earlier `start`.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::defaults::STATE_DIR;

/// Canonical paths for runtime artefacts written by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    state_dir: PathBuf,
    pid_path: PathBuf,
    log_path: PathBuf,
}

impl RuntimePaths {
    /// Derives runtime paths beneath the project root without touching the
    /// filesystem.
    #[must_use]
    pub fn from_root(root: &Path) -> Self {
        let state_dir = root.join(STATE_DIR);
        Self {
            pid_path: state_dir.join("host.pid"),
            log_path: state_dir.join("host.log"),
            state_dir,
        }
    }

    /// Creates the state directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimePathsError::StateDirectory`] when the directory cannot
    /// be created.
    pub fn ensure_state_dir(&self) -> Result<(), RuntimePathsError> {
        fs::create_dir_all(&self.state_dir).map_err(|source| RuntimePathsError::StateDirectory {
            path: self.state_dir.clone(),
            source,
        })
    }

    /// Directory holding runtime artefacts.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        self.state_dir.as_path()
    }

    /// Path to the PID record.
    #[must_use]
    pub fn pid_path(&self) -> &Path {
        self.pid_path.as_path()
    }

    /// Path receiving the host process's stdout and stderr.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        self.log_path.as_path()
    }
}

/// Errors raised while preparing runtime paths.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    /// Creating the state directory failed.
    #[error("failed to prepare state directory '{path}': {source}")]
    StateDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
}
