//! Supervision of the host process.
//!
//! The supervisor owns the PID file under the project's state directory and
//! talks to the host through two seams: [`ProcessControl`] for the OS process
//! and [`HostLink`] for the automation server. Both are mocked in tests.

mod error;
mod link;
mod pid;
mod process;
mod supervisor;

pub use error::LifecycleError;
pub use link::{HostLink, QUIT_ACTION, QUIT_SCRIPT};
pub use pid::PidFile;
pub use process::{LaunchSpec, ProcessControl, SystemProcess};
pub use supervisor::{POLL_INTERVAL, SHUTDOWN_TIMEOUT, STARTUP_BACKOFF, Supervisor};

#[cfg(test)]
pub(crate) use link::MockHostLink;
#[cfg(test)]
pub(crate) use process::MockProcessControl;
