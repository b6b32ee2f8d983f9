//! Launching and terminating the host process.
//!
//! The platform implementation is picked at compile time and exposed as
//! [`SystemProcess`].

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use blendwire_config::defaults::BOOTSTRAP_SCRIPT;
use tracing::info;

use super::LifecycleError;

/// Everything needed to launch a detached host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Host binary to run.
    pub executable: PathBuf,
    /// Arguments passed after the executable.
    pub arguments: Vec<OsString>,
    /// Directory the host starts in.
    pub working_dir: PathBuf,
    /// Receives the host's stdout and stderr.
    pub log_path: PathBuf,
}

impl LaunchSpec {
    /// Launches `executable` with the project's bootstrap script, which
    /// starts the automation server inside the host.
    pub fn bootstrap(executable: &Path, project_root: &Path, log_path: &Path) -> Self {
        Self {
            executable: executable.to_path_buf(),
            arguments: vec![
                OsString::from("--python"),
                project_root.join(BOOTSTRAP_SCRIPT).into_os_string(),
            ],
            working_dir: project_root.to_path_buf(),
            log_path: log_path.to_path_buf(),
        }
    }
}

/// Spawns and stops host processes.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessControl {
    /// Spawns the host detached from this process and returns its pid.
    fn spawn_detached(&self, launch: &LaunchSpec) -> Result<u32, LifecycleError>;

    /// Asks `pid` to exit. Fails with [`LifecycleError::NotRunning`] when the
    /// process is already gone.
    fn terminate(&self, pid: u32) -> Result<(), LifecycleError>;
}

/// Process control for the platform this binary was built for.
#[cfg(unix)]
pub type SystemProcess = UnixProcess;

/// Process control for the platform this binary was built for.
#[cfg(windows)]
pub type SystemProcess = WindowsProcess;

/// Process control for the platform this binary was built for.
#[cfg(not(any(unix, windows)))]
pub type SystemProcess = UnsupportedProcess;

/// Builds the command shared by both platforms: null stdin, output appended
/// to the host log.
fn base_command(launch: &LaunchSpec) -> Result<Command, LifecycleError> {
    let open_log = || {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&launch.log_path)
            .map_err(|source| LifecycleError::OpenLog {
                path: launch.log_path.clone(),
                source,
            })
    };
    let stdout = open_log()?;
    let stderr = open_log()?;
    let mut command = Command::new(&launch.executable);
    command
        .args(&launch.arguments)
        .current_dir(&launch.working_dir)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);
    Ok(command)
}

fn spawn(command: &mut Command, launch: &LaunchSpec) -> Result<u32, LifecycleError> {
    let child = command.spawn().map_err(|source| LifecycleError::Launch {
        binary: launch.executable.clone(),
        source,
    })?;
    let pid = child.id();
    info!(pid, executable = %launch.executable.display(), "spawned host process");
    Ok(pid)
}

/// Process control via `kill(2)`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixProcess;

#[cfg(unix)]
impl ProcessControl for UnixProcess {
    fn spawn_detached(&self, launch: &LaunchSpec) -> Result<u32, LifecycleError> {
        // Plain fork semantics; the child stays in our process group and is
        // never waited on.
        spawn(&mut base_command(launch)?, launch)
    }

    fn terminate(&self, pid: u32) -> Result<(), LifecycleError> {
        use std::io;

        let raw = libc::pid_t::try_from(pid).map_err(|_| LifecycleError::InvalidPid {
            pid,
            reason: "exceeds the platform pid range",
        })?;
        if raw <= 0 {
            return Err(LifecycleError::InvalidPid {
                pid,
                reason: "would signal a whole process group",
            });
        }
        // SAFETY: `kill(2)` is memory-safe for any pid; failures are reported
        // through the return value and errno.
        let result = unsafe { libc::kill(raw, libc::SIGTERM) };
        if result == 0 {
            info!(pid, "sent SIGTERM to host process");
            return Ok(());
        }
        let source = io::Error::last_os_error();
        if source.raw_os_error() == Some(libc::ESRCH) {
            Err(LifecycleError::NotRunning { pid })
        } else {
            Err(LifecycleError::SignalFailed { pid, source })
        }
    }
}

/// Process control via creation flags and `taskkill`.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsProcess;

#[cfg(windows)]
impl WindowsProcess {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    /// `taskkill` status when no process matches the pid.
    const TASKKILL_NOT_FOUND: i32 = 128;
}

#[cfg(windows)]
impl ProcessControl for WindowsProcess {
    fn spawn_detached(&self, launch: &LaunchSpec) -> Result<u32, LifecycleError> {
        use std::os::windows::process::CommandExt;

        let mut command = base_command(launch)?;
        command.creation_flags(Self::DETACHED_PROCESS | Self::CREATE_NEW_PROCESS_GROUP);
        spawn(&mut command, launch)
    }

    fn terminate(&self, pid: u32) -> Result<(), LifecycleError> {
        let status = Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| LifecycleError::SignalFailed { pid, source })?;
        match status.code() {
            Some(0) => {
                info!(pid, "killed host process tree");
                Ok(())
            }
            Some(Self::TASKKILL_NOT_FOUND) => Err(LifecycleError::NotRunning { pid }),
            _ => Err(LifecycleError::KillFailed {
                pid,
                status: status.to_string(),
            }),
        }
    }
}

/// Refuses every request on platforms without process groups or job flags.
#[cfg(not(any(unix, windows)))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProcess;

#[cfg(not(any(unix, windows)))]
impl ProcessControl for UnsupportedProcess {
    fn spawn_detached(&self, _launch: &LaunchSpec) -> Result<u32, LifecycleError> {
        Err(LifecycleError::UnsupportedPlatform)
    }

    fn terminate(&self, _pid: u32) -> Result<(), LifecycleError> {
        Err(LifecycleError::UnsupportedPlatform)
    }
}
