//! Parses argv, runs the selected command, and prints its envelope.

mod arguments;
mod envelope;
mod error;

use std::ffi::OsString;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use blendwire_rpc::RpcClient;
use serde_json::Value;
use tracing::{debug, warn};

pub use arguments::Arguments;
pub use envelope::{Envelope, FAILURE_EXIT, truthy};
pub use error::CommandError;

use crate::config::ConfigLoader;
use crate::parser::{bind_arguments, build_parser, config_arguments};
use crate::registry::{CommandContext, CommandSpec, Handler, Registry};
use crate::{AppError, IoStreams, exit_code_from_status, telemetry};

/// Runs one CLI invocation against a registry.
pub(crate) struct Dispatcher<'a, L: ConfigLoader> {
    registry: &'a Registry,
    loader: &'a L,
}

impl<'a, L: ConfigLoader> Dispatcher<'a, L> {
    pub(crate) const fn new(registry: &'a Registry, loader: &'a L) -> Self {
        Self { registry, loader }
    }

    pub(crate) fn run<I, W, E>(&self, args: I, io: &mut IoStreams<'_, W, E>) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
        W: Write,
        E: Write,
    {
        let matches = match build_parser(self.registry).try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(error) => return report_usage(&error, io),
        };

        let config = match self.loader.load(&config_arguments(&matches)) {
            Ok(config) => config,
            Err(error) => return emit(&Envelope::failure(error.to_string()), io),
        };
        if let Err(error) = telemetry::initialise(&config) {
            let _ = writeln!(io.stderr, "warning: {error}");
        }

        let Some((name, sub_matches)) = matches.subcommand() else {
            return emit(&Envelope::failure("no command given"), io);
        };
        let Some(spec) = self.registry.get(name) else {
            return emit(&Envelope::failure(format!("unknown command '{name}'")), io);
        };

        let arguments = bind_arguments(spec, sub_matches);
        let context = CommandContext {
            config: &config,
            registry: self.registry,
        };
        let envelope = invoke(spec, &context, &arguments);
        emit(&envelope, io)
    }
}

/// Calls the command body and folds every outcome, panics included, into
/// an envelope.
pub(crate) fn invoke(
    spec: &CommandSpec,
    context: &CommandContext<'_>,
    arguments: &Arguments,
) -> Envelope {
    debug!(command = %spec.name, "dispatching command");
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(spec, context, arguments)));
    match outcome {
        Ok(Ok(value)) => Envelope::from_result(value),
        Ok(Err(error)) => {
            debug!(command = %spec.name, %error, "command failed");
            Envelope::from_error(&error)
        }
        Err(payload) => {
            warn!(command = %spec.name, "command panicked");
            Envelope::from_panic(&spec.name, payload.as_ref())
        }
    }
}

fn call(
    spec: &CommandSpec,
    context: &CommandContext<'_>,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    match spec.handler {
        Handler::Local(body) => body(context, arguments),
        Handler::Remote(body) => {
            let client = RpcClient::new(context.config.base_url())?;
            body(context, &client, arguments)
        }
    }
}

fn emit<W: Write, E: Write>(envelope: &Envelope, io: &mut IoStreams<'_, W, E>) -> ExitCode {
    match write_envelope(envelope, &mut *io.stdout) {
        Ok(()) => envelope.exit_code(),
        Err(error) => {
            let _ = writeln!(io.stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn write_envelope<W: Write>(envelope: &Envelope, stdout: &mut W) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *stdout, envelope).map_err(AppError::SerialiseEnvelope)?;
    stdout.write_all(b"\n").map_err(AppError::EmitEnvelope)?;
    stdout.flush().map_err(AppError::EmitEnvelope)
}

/// Help and version go to stdout with status 0; usage errors go to stderr
/// with clap's status.
fn report_usage<W: Write, E: Write>(error: &clap::Error, io: &mut IoStreams<'_, W, E>) -> ExitCode {
    let written = if error.use_stderr() {
        write!(io.stderr, "{error}")
    } else {
        write!(io.stdout, "{error}")
    };
    if written.is_err() {
        return ExitCode::FAILURE;
    }
    exit_code_from_status(error.exit_code())
}
