//! Commands forwarded to the automation server.

use std::time::Duration;

use blendwire_rpc::{Backoff, RpcClient, is_healthy};
use serde_json::{Map, Value};

use crate::dispatch::{Arguments, CommandError, Envelope};
use crate::registry::{CommandContext, CommandDecl, Handler, ParamDecl, TypeHint};

/// Sends `action` with every bound argument as its parameters.
fn forward(
    client: &RpcClient,
    action: &str,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    let reply = client.command(action, &arguments.to_params())?;
    Ok(Envelope::from_host_reply(action, reply).into_value())
}

pub(super) fn health() -> CommandDecl {
    CommandDecl {
        function: "health",
        doc: "Check the automation server once.",
        params: vec![ParamDecl::client()],
        handler: Handler::Remote(run_health),
    }
}

fn run_health(
    _context: &CommandContext<'_>,
    client: &RpcClient,
    _arguments: &Arguments,
) -> Result<Value, CommandError> {
    let body = client.health()?;
    let healthy = is_healthy(&body);
    let fields = match body {
        Value::Object(fields) => fields,
        other => Map::from_iter([(String::from("response"), other)]),
    };
    let envelope = Envelope::from_fields(healthy, fields).or_error("server reported unhealthy");
    Ok(envelope.into_value())
}

pub(super) fn ping() -> CommandDecl {
    let defaults = Backoff::DEFAULT;
    CommandDecl {
        function: "ping",
        doc: "Poll the health endpoint with exponential backoff until it answers.

              :param attempts: Maximum number of checks.
              :param base_delay: Seconds slept after the first failed check; doubles each retry.",
        params: vec![
            ParamDecl::client(),
            ParamDecl::optional("attempts", TypeHint::Int, defaults.max_attempts()),
            ParamDecl::optional(
                "base_delay",
                TypeHint::Float,
                defaults.base_delay().as_secs_f64(),
            ),
        ],
        handler: Handler::Remote(run_ping),
    }
}

fn run_ping(
    _context: &CommandContext<'_>,
    client: &RpcClient,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    let attempts = u32::try_from(arguments.integer("attempts")?)
        .ok()
        .filter(|attempts| *attempts > 0)
        .ok_or_else(|| CommandError::argument("attempts", "a positive integer"))?;
    let seconds = arguments.float("base_delay")?;
    let base_delay = Duration::try_from_secs_f64(seconds)
        .map_err(|_| CommandError::argument("base_delay", "a non-negative number of seconds"))?;

    let healthy = client.ping_with_backoff(attempts, base_delay)?;
    let envelope = Envelope::from_fields(healthy, Map::new())
        .with("healthy", healthy)
        .with("attempts", attempts)
        .with("base_delay", seconds)
        .or_error(format!(
            "server did not become healthy after {attempts} attempts"
        ));
    Ok(envelope.into_value())
}

pub(super) fn execute() -> CommandDecl {
    CommandDecl {
        function: "execute",
        doc: "Run a Python snippet inside the host.

              :param code: Python source executed in the host's interpreter.",
        params: vec![
            ParamDecl::client(),
            ParamDecl::required("code", TypeHint::Str),
        ],
        handler: Handler::Remote(run_execute),
    }
}

fn run_execute(
    _context: &CommandContext<'_>,
    client: &RpcClient,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    forward(client, "execute", arguments)
}

pub(super) fn apply_node_group() -> CommandDecl {
    CommandDecl {
        function: "apply_node_group",
        doc: "Attach a geometry node group to an object as a modifier.

              :param object_name: Object receiving the modifier.
              :param node_group: Name of the node group to attach.
              :param apply_modifier: Apply the modifier immediately instead of leaving it live.",
        params: vec![
            ParamDecl::client(),
            ParamDecl::required("object_name", TypeHint::Str),
            ParamDecl::required("node_group", TypeHint::Str),
            ParamDecl::optional("apply_modifier", TypeHint::Bool, false),
        ],
        handler: Handler::Remote(run_apply_node_group),
    }
}

fn run_apply_node_group(
    _context: &CommandContext<'_>,
    client: &RpcClient,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    forward(client, "apply_node_group", arguments)
}

pub(super) fn render_viewport() -> CommandDecl {
    CommandDecl {
        function: "render_viewport",
        doc: "Render the viewport to an image file.

              :param output_path: Destination image path, resolved by the host.
              :param width: Image width in pixels.
              :param height: Image height in pixels.
              :param camera: Camera object to render from; the scene camera when omitted.",
        params: vec![
            ParamDecl::client(),
            ParamDecl::required("output_path", TypeHint::Str),
            ParamDecl::optional("width", TypeHint::Int, 1920),
            ParamDecl::optional("height", TypeHint::Int, 1080),
            ParamDecl::optional("camera", TypeHint::optional(TypeHint::Str), Value::Null),
        ],
        handler: Handler::Remote(run_render_viewport),
    }
}

fn run_render_viewport(
    _context: &CommandContext<'_>,
    client: &RpcClient,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    forward(client, "render_viewport", arguments)
}

pub(super) fn get_mesh_metrics() -> CommandDecl {
    CommandDecl {
        function: "get_mesh_metrics",
        doc: "Report vertex, edge, and face counts plus bounds for a mesh object.

              :param object_name: Mesh object to inspect.
              :param watertight: Also check whether the mesh is closed and manifold.",
        params: vec![
            ParamDecl::client(),
            ParamDecl::required("object_name", TypeHint::Str),
            ParamDecl::optional("watertight", TypeHint::Bool, true),
        ],
        handler: Handler::Remote(run_get_mesh_metrics),
    }
}

fn run_get_mesh_metrics(
    _context: &CommandContext<'_>,
    client: &RpcClient,
    arguments: &Arguments,
) -> Result<Value, CommandError> {
    forward(client, "get_mesh_metrics", arguments)
}
