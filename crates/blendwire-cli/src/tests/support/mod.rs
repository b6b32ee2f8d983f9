//! Harness types shared by the behavioural and runtime tests.
//!
//! [`TestWorld`] owns the configuration handed to the CLI, an optional fake
//! host, and the captured output of the last run.

use std::cell::RefCell;
use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{Context, Result, ensure};
use blendwire_config::Config;
use rstest::fixture;
use serde_json::Value;
use tempfile::TempDir;

use crate::{AppError, ConfigLoader, IoStreams, OrthoConfigLoader, run_with_loader};

pub(super) use blendwire_rpc::test_support::{
    Canned, FakeHost, RecordedRequest, unreachable_base_url,
};

/// A config loader that returns a fixed configuration and ignores flags.
pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

#[derive(Default)]
pub(super) struct TestWorld {
    pub config: Config,
    pub host: Option<FakeHost>,
    pub root: Option<TempDir>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
}

impl TestWorld {
    pub fn start_host(&mut self, responses: Vec<Canned>) -> Result<()> {
        let host = FakeHost::spawn(responses)?;
        self.config.base_url = host.base_url();
        self.host = Some(host);
        Ok(())
    }

    pub fn use_unreachable_host(&mut self) -> Result<()> {
        self.config.base_url = unreachable_base_url()?;
        Ok(())
    }

    pub fn use_empty_project(&mut self) -> Result<()> {
        let root = TempDir::new().context("create project root")?;
        self.config.project_root = root.path().to_path_buf();
        self.root = Some(root);
        Ok(())
    }

    /// Runs `command` against the world's fixed configuration.
    pub fn run(&mut self, command: &str) {
        let loader = StaticConfigLoader::new(self.config.clone());
        self.run_with(command, &loader);
    }

    /// Runs `command` through the real layered loader, so top-level flags
    /// take effect.
    pub fn run_configured(&mut self, command: &str) {
        self.run_with(command, &OrthoConfigLoader);
    }

    fn run_with<L: ConfigLoader>(&mut self, command: &str, loader: &L) {
        self.stdout.clear();
        self.stderr.clear();
        let args = Self::build_args(command);
        let mut io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        self.exit_code = Some(run_with_loader(args, &mut io, loader));
    }

    fn build_args(command: &str) -> Vec<OsString> {
        let mut args = vec![OsString::from("blendwire")];
        args.extend(
            command
                .trim()
                .trim_matches('"')
                .split_whitespace()
                .map(OsString::from),
        );
        args
    }

    pub fn stdout_text(&self) -> Result<String> {
        String::from_utf8(self.stdout.clone()).context("stdout utf8")
    }

    pub fn stderr_text(&self) -> Result<String> {
        String::from_utf8(self.stderr.clone()).context("stderr utf8")
    }

    pub fn envelope(&self) -> Result<Value> {
        serde_json::from_slice(&self.stdout).context("stdout is not a JSON envelope")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.host
            .as_ref()
            .map(FakeHost::requests)
            .unwrap_or_default()
    }

    pub fn assert_exit_code(&self, expected: u8) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == ExitCode::from(expected),
            "expected exit code {expected}, got {exit:?}"
        );
        Ok(())
    }
}

#[fixture]
pub(super) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}
