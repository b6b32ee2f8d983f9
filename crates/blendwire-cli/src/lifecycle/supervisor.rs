//! Start, stop, and restart the host, keeping the PID file in step.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use blendwire_config::{Config, ExecutableResolver, RuntimePaths};
use blendwire_rpc::Backoff;
use tracing::{info, warn};

use super::{HostLink, LaunchSpec, LifecycleError, PidFile, ProcessControl, QUIT_ACTION};
use crate::dispatch::Envelope;

/// Cold-start budget: a host can take several seconds to load the server.
pub const STARTUP_BACKOFF: Backoff = Backoff::new(8, Duration::from_millis(250));

/// How long a restart waits for the old server to go quiet.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between health checks while waiting for the old server to stop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Drives the host lifecycle through a [`ProcessControl`] and a
/// [`HostLink`].
///
/// Expected outcomes, including "could not start", come back as envelopes.
/// `Err` is reserved for broken local state such as an unreadable PID file.
pub struct Supervisor<P, H> {
    process: P,
    link: H,
    paths: RuntimePaths,
    resolver: ExecutableResolver,
    project_root: PathBuf,
    startup: Backoff,
    shutdown_timeout: Duration,
    poll_interval: Duration,
}

impl<P: ProcessControl, H: HostLink> Supervisor<P, H> {
    /// Binds the supervisor to the runtime paths, executable resolver, and
    /// project root derived from `config`, with the default budgets.
    pub fn new(process: P, link: H, config: &Config) -> Self {
        Self {
            process,
            link,
            paths: config.runtime_paths(),
            resolver: config.executable_resolver(),
            project_root: config.project_root().to_path_buf(),
            startup: STARTUP_BACKOFF,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Replaces the executable resolver, e.g. to pin the search inputs.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ExecutableResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the health polling budget used after a spawn.
    #[must_use]
    pub const fn with_startup_backoff(mut self, backoff: Backoff) -> Self {
        self.startup = backoff;
        self
    }

    /// Replaces how long, and how often, a restart polls for the old server
    /// to stop answering.
    #[must_use]
    pub const fn with_shutdown_wait(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    fn pid_file(&self) -> PidFile {
        PidFile::new(self.paths.pid_path())
    }

    /// Launches the host unless a tracked one already answers.
    pub fn start(&self, explicit: Option<&Path>) -> Result<Envelope, LifecycleError> {
        let pid_file = self.pid_file();
        if let Some(pid) = pid_file.read()? {
            if self.link.is_healthy() {
                info!(pid, "host already running");
                return Ok(Envelope::success()
                    .with("pid", pid)
                    .with("already_running", true));
            }
            warn!(pid, "tracked host does not answer; discarding stale pid record");
            pid_file.clear()?;
        }

        let resolved = match self.resolver.resolve(explicit) {
            Ok(resolved) => resolved,
            Err(error) => {
                let Some(searched) = error.searched().map(<[String]>::to_vec) else {
                    return Err(error.into());
                };
                return Ok(Envelope::failure(error.to_string()).with("searched", searched));
            }
        };

        self.paths.ensure_state_dir()?;
        let log_path = self.paths.log_path();
        let launch = LaunchSpec::bootstrap(&resolved.path, &self.project_root, log_path);
        let executable = resolved.path.display().to_string();
        let pid = match self.process.spawn_detached(&launch) {
            Ok(pid) => pid,
            Err(error) => {
                return Ok(Envelope::failure(error.to_string()).with("executable", executable));
            }
        };

        let envelope = Envelope::success()
            .with("pid", pid)
            .with("executable", executable)
            .with("source", resolved.source.to_string())
            .with("log", log_path.display().to_string());
        if let Err(error) = pid_file.write(pid) {
            return Ok(envelope.failed(error.to_string()));
        }

        match self.link.wait_until_healthy(self.startup) {
            Ok(true) => {
                info!(pid, "host is healthy");
                Ok(envelope)
            }
            Ok(false) => Ok(envelope.failed(format!(
                "host process {pid} did not become healthy after {} attempts; see {}",
                self.startup.max_attempts(),
                log_path.display()
            ))),
            Err(error) => Ok(envelope.failed(format!(
                "host process {pid} failed its health check: {error}"
            ))),
        }
    }

    /// Stops the tracked host, or asks an untracked one to quit.
    pub fn shutdown(&self) -> Result<Envelope, LifecycleError> {
        let pid_file = self.pid_file();
        if let Some(pid) = pid_file.read()? {
            match self.process.terminate(pid) {
                Ok(()) => {
                    pid_file.clear()?;
                    return Ok(Envelope::success().with("method", "pid").with("pid", pid));
                }
                Err(LifecycleError::NotRunning { .. }) => {
                    warn!(pid, "tracked host already exited; clearing pid record");
                    pid_file.clear()?;
                }
                Err(error) => {
                    return Ok(Envelope::failure(error.to_string())
                        .with("method", "pid")
                        .with("pid", pid));
                }
            }
        }

        match self.link.request_quit() {
            Ok(reply) => {
                let envelope =
                    Envelope::from_host_reply(QUIT_ACTION, reply).with("method", "server");
                if envelope.ok() {
                    info!("asked untracked host to quit");
                } else {
                    warn!(error = envelope.error(), "host refused to quit");
                }
                Ok(envelope)
            }
            Err(error) => Ok(Envelope::failure(format!(
                "nothing to shut down: no tracked host process and server unreachable ({error})"
            ))),
        }
    }

    /// Shuts down, waits for the server to go quiet, then starts again.
    pub fn restart(&self, explicit: Option<&Path>) -> Result<Envelope, LifecycleError> {
        let shutdown = self.shutdown()?;
        if shutdown.ok() {
            self.wait_for_shutdown();
        }
        let started = self.start(explicit)?;
        Ok(started.with("shutdown", shutdown.into_value()))
    }

    /// Tracked pid and a single health check.
    pub fn status(&self) -> Result<Envelope, LifecycleError> {
        let pid_file = self.pid_file();
        let pid = pid_file.read()?;
        Ok(Envelope::success()
            .with("pid", pid)
            .with("healthy", self.link.is_healthy())
            .with("pid_file", pid_file.path().display().to_string()))
    }

    fn wait_for_shutdown(&self) {
        let deadline = Instant::now() + self.shutdown_timeout;
        while self.link.is_healthy() {
            if Instant::now() >= deadline {
                warn!(
                    timeout_ms = self.shutdown_timeout.as_millis(),
                    "old host still answering; starting anyway"
                );
                return;
            }
            thread::sleep(self.poll_interval);
        }
    }
}
