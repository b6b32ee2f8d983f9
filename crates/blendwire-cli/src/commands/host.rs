//! Host process lifecycle commands.

use std::path::PathBuf;

use blendwire_rpc::RpcClient;
use serde_json::Value;

use crate::dispatch::{Arguments, CommandError};
use crate::lifecycle::{Supervisor, SystemProcess};
use crate::registry::{CommandContext, CommandDecl, Handler, ParamDecl, TypeHint};

fn supervisor(
    context: &CommandContext<'_>,
    client: &RpcClient,
) -> Supervisor<SystemProcess, RpcClient> {
    Supervisor::new(SystemProcess::default(), client.clone(), context.config)
}

fn executable_param() -> ParamDecl {
    ParamDecl::optional("executable", TypeHint::optional(TypeHint::Str), Value::Null)
}

fn explicit_executable(arguments: &Arguments) -> Result<Option<PathBuf>, CommandError> {
    Ok(arguments.optional_string("executable")?.map(PathBuf::from))
}

pub(super) fn start() -> CommandDecl {
    CommandDecl {
        function: "start",
        doc: "Launch the host with the automation server and wait until it is healthy.

              :param executable: Path to the host executable; overrides every other source.",
        params: vec![ParamDecl::client(), executable_param()],
        handler: Handler::Remote(run_start),
    }
}

fn run_start(
    context: &CommandContext<'_>,
    client: &RpcClient,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    let explicit = explicit_executable(arguments)?;
    let envelope = supervisor(context, client).start(explicit.as_deref())?;
    Ok(envelope.into_value())
}

pub(super) fn shutdown() -> CommandDecl {
    CommandDecl {
        function: "shutdown",
        doc: "Stop the tracked host process, or ask an untracked server to quit.",
        params: vec![ParamDecl::client()],
        handler: Handler::Remote(run_shutdown),
    }
}

fn run_shutdown(
    context: &CommandContext<'_>,
    client: &RpcClient,
    _arguments: &Arguments,
) -> Result<Value, CommandError> {
    Ok(supervisor(context, client).shutdown()?.into_value())
}

pub(super) fn restart() -> CommandDecl {
    CommandDecl {
        function: "restart",
        doc: "Shut the host down, wait for the server to go quiet, and start it again.

              :param executable: Path to the host executable; overrides every other source.",
        params: vec![ParamDecl::client(), executable_param()],
        handler: Handler::Remote(run_restart),
    }
}

fn run_restart(
    context: &CommandContext<'_>,
    client: &RpcClient,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    let explicit = explicit_executable(arguments)?;
    let envelope = supervisor(context, client).restart(explicit.as_deref())?;
    Ok(envelope.into_value())
}

pub(super) fn status() -> CommandDecl {
    CommandDecl {
        function: "status",
        doc: "Report the tracked host pid and whether the server answers.",
        params: vec![ParamDecl::client()],
        handler: Handler::Remote(run_status),
    }
}

fn run_status(
    context: &CommandContext<'_>,
    client: &RpcClient,
    _arguments: &Arguments,
) -> Result<Value, CommandError> {
    let envelope = supervisor(context, client)
        .status()?
        .with("base_url", client.base_url());
    Ok(envelope.into_value())
}
