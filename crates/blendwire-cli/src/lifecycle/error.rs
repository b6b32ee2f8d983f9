//! Error types for host lifecycle operations.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use blendwire_config::{ExecutableError, RuntimePathsError};
use thiserror::Error;

/// Errors raised while managing the host process.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to resolve the host executable: {0}")]
    Executable(#[from] ExecutableError),
    #[error(transparent)]
    Paths(#[from] RuntimePathsError),
    #[error("failed to read pid file {path:?}: {source}")]
    ReadPid {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse pid file {path:?}: {source}")]
    ParsePid {
        path: PathBuf,
        #[source]
        source: ParseIntError,
    },
    #[error("failed to write pid file {path:?}: {source}")]
    WritePid {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove pid file {path:?}: {source}")]
    ClearPid {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open host log {path:?}: {source}")]
    OpenLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to spawn host executable {binary:?}: {source}")]
    Launch {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("refusing to signal pid {pid}: {reason}")]
    InvalidPid { pid: u32, reason: &'static str },
    #[error("host process {pid} is not running")]
    NotRunning { pid: u32 },
    #[error("failed to signal host pid {pid}: {source}")]
    SignalFailed {
        pid: u32,
        #[source]
        source: io::Error,
    },
    #[error("taskkill exited with {status} for pid {pid}")]
    KillFailed { pid: u32, status: String },
    #[cfg(not(any(unix, windows)))]
    #[error("platform does not support host process control")]
    UnsupportedPlatform,
}
