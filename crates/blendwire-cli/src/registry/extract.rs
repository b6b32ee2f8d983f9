//! Builds command specs from declarations and their structured documentation.

use std::collections::{HashMap, HashSet};

use super::RegistryError;
use super::model::{CLIENT_PARAM, CommandDecl, CommandSpec, ParameterSpec};

const PARAM_PREFIX: &str = ":param";

/// Extracts a [`CommandSpec`] from a declaration.
///
/// # Errors
///
/// Fails when the documentation lacks a summary, a parameter is undocumented
/// or repeated, or the handler kind disagrees with the client parameter.
pub fn extract(decl: CommandDecl) -> Result<CommandSpec, RegistryError> {
    let name = decl.function.replace('_', "-");
    let summary = summary_line(decl.doc).ok_or_else(|| RegistryError::MissingSummary {
        function: decl.function.to_owned(),
    })?;
    let docs = param_docs(decl.doc);

    let needs_client = decl
        .params
        .first()
        .is_some_and(|first| first.name == CLIENT_PARAM);
    check_handler(&name, needs_client, decl.handler.takes_client())?;

    let mut seen = HashSet::new();
    let mut params = Vec::with_capacity(decl.params.len());
    for (index, param) in decl.params.into_iter().enumerate() {
        if index == 0 && needs_client {
            continue;
        }
        if !seen.insert(param.name) {
            return Err(RegistryError::DuplicateParameter {
                command: name,
                parameter: param.name.to_owned(),
            });
        }
        let Some(help_text) = docs.get(param.name) else {
            return Err(RegistryError::MissingParamDoc {
                command: name,
                parameter: param.name.to_owned(),
            });
        };
        params.push(ParameterSpec {
            name: param.name.to_owned(),
            param_type: param.hint.normalise(),
            default: param.default,
            help_text: (*help_text).to_owned(),
        });
    }

    Ok(CommandSpec {
        name,
        function: decl.function,
        handler: decl.handler,
        needs_client,
        summary,
        doc_text: decl.doc.trim().to_owned(),
        params,
    })
}

fn check_handler(name: &str, needs_client: bool, takes_client: bool) -> Result<(), RegistryError> {
    let reason = match (needs_client, takes_client) {
        (true, false) => "declares a client parameter but has a local handler",
        (false, true) => "has a remote handler but no leading client parameter",
        _ => return Ok(()),
    };
    Err(RegistryError::HandlerMismatch {
        command: name.to_owned(),
        reason,
    })
}

fn summary_line(doc: &str) -> Option<String> {
    doc.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| !line.starts_with(PARAM_PREFIX))
        .map(str::to_owned)
}

/// Collects `:param <name>: <text>` lines. Lines with empty text are ignored.
fn param_docs(doc: &str) -> HashMap<&str, &str> {
    doc.lines()
        .filter_map(|line| line.trim().strip_prefix(PARAM_PREFIX))
        .filter_map(|rest| {
            let (raw_name, raw_text) = rest.split_once(':')?;
            let (name, text) = (raw_name.trim(), raw_text.trim());
            (!name.is_empty() && !text.is_empty()).then_some((name, text))
        })
        .collect()
}
