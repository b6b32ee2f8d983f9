//! Commands answered without contacting the host.

use serde_json::{Value, json};

use crate::dispatch::{Arguments, CommandError, Envelope};
use crate::parser::arg_for;
use crate::registry::{CommandContext, CommandDecl, CommandSpec, Handler};

pub(super) fn list_commands() -> CommandDecl {
    CommandDecl {
        function: "list_commands",
        doc: "List every registered command with its parameters.",
        params: Vec::new(),
        handler: Handler::Local(run_list_commands),
    }
}

fn run_list_commands(
    context: &CommandContext<'_>,
    _arguments: &Arguments,
) -> Result<Value, CommandError> {
    let commands: Vec<Value> = context.registry.iter().map(describe).collect();
    Ok(Envelope::success().with("commands", commands).into_value())
}

fn describe(spec: &CommandSpec) -> Value {
    let params: Vec<Value> = spec
        .params
        .iter()
        .map(|param| {
            json!({
                "name": param.name,
                "flag": arg_for(param).get_long().map(|long| format!("--{long}")),
                "type": param.param_type.to_string(),
                "required": !param.has_default(),
                "default": param.default,
                "help": param.help_text,
            })
        })
        .collect();
    json!({
        "name": spec.name,
        "summary": spec.summary,
        "needs_client": spec.needs_client,
        "params": params,
    })
}
