//! Command-line driver for a Blender instance running an HTTP automation
//! server.
//!
//! Commands are declared once in [`commands`](crate::commands), validated
//! into a [`Registry`](crate::registry::Registry), and exposed as clap
//! subcommands. Every invocation prints exactly one JSON envelope on stdout;
//! diagnostics go to stderr. The runtime takes its IO streams and
//! configuration loader as parameters so tests can substitute both.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

mod commands;
mod config;
mod dispatch;
mod errors;
mod lifecycle;
mod parser;
mod registry;
mod telemetry;

pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use dispatch::Dispatcher;
pub use dispatch::{Envelope, FAILURE_EXIT};
pub(crate) use errors::AppError;
use registry::Registry;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let registry = match Registry::global() {
        Ok(registry) => registry,
        Err(error) => {
            let _ = writeln!(io.stderr, "{}", AppError::from(error));
            return ExitCode::FAILURE;
        }
    };
    Dispatcher::new(registry, loader).run(args, io)
}

pub(crate) fn exit_code_from_status(status: i32) -> ExitCode {
    u8::try_from(status).map_or(ExitCode::FAILURE, ExitCode::from)
}

#[cfg(test)]
mod tests;
