//! Derives the clap command tree from the registry and binds matches back
//! into [`Arguments`].

use std::ffi::OsString;

use blendwire_config::defaults::DEFAULT_BASE_URL;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use serde_json::Value;

use crate::dispatch::{Arguments, truthy};
use crate::registry::{CommandSpec, ParamType, ParameterSpec, Registry};

pub(crate) const BIN_NAME: &str = "blendwire";

const BASE_URL_ARG: &str = "base_url";
const LOG_FILTER_ARG: &str = "log_filter";
const LOG_FORMAT_ARG: &str = "log_format";
const CONFIG_PATH_ARG: &str = "config_path";

/// Top-level flags forwarded to the configuration loader, by id and flag.
const CONFIG_FLAGS: &[(&str, &str)] = &[
    (CONFIG_PATH_ARG, "--config-path"),
    (BASE_URL_ARG, "--base-url"),
    (LOG_FILTER_ARG, "--log-filter"),
    (LOG_FORMAT_ARG, "--log-format"),
];

/// Parameter that gets a short alias, and the alias itself.
const TARGET_PARAM: &str = "object_name";
const TARGET_SHORT: char = 'o';

/// Builds the root command with one subcommand per registered command.
pub(crate) fn build_parser(registry: &Registry) -> Command {
    let root = Command::new(BIN_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Drive a running Blender instance over its HTTP automation server")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new(CONFIG_PATH_ARG)
                .long("config-path")
                .value_name("PATH")
                .action(ArgAction::Set)
                .help("TOML file layered beneath the environment and flags"),
        )
        .arg(
            Arg::new(BASE_URL_ARG)
                .long("base-url")
                .value_name("URL")
                .action(ArgAction::Set)
                .help(format!(
                    "Base URL of the automation server [default: {DEFAULT_BASE_URL}]"
                )),
        )
        .arg(
            Arg::new(LOG_FILTER_ARG)
                .long("log-filter")
                .value_name("FILTER")
                .action(ArgAction::Set)
                .help("Tracing filter for diagnostics written to stderr"),
        )
        .arg(
            Arg::new(LOG_FORMAT_ARG)
                .long("log-format")
                .value_name("FORMAT")
                .action(ArgAction::Set)
                .value_parser(["json", "compact"])
                .help("Diagnostic log format"),
        );
    registry
        .iter()
        .fold(root, |command, spec| command.subcommand(subcommand_for(spec)))
}

fn subcommand_for(spec: &CommandSpec) -> Command {
    spec.params.iter().fold(
        Command::new(spec.name.clone())
            .about(spec.summary.clone())
            .long_about(spec.description()),
        |command, param| command.arg(arg_for(param)),
    )
}

/// Maps one parameter onto a flag.
///
/// Booleans defaulting to true become `--no-<name>` clearing flags; other
/// booleans are enabling flags, mandatory when there is no default. Valued
/// flags are typed and mandatory without a default.
pub(crate) fn arg_for(param: &ParameterSpec) -> Arg {
    let flag = param.flag_name();
    let base = Arg::new(param.name.clone()).help(param.help_text.clone());
    let shaped = match param.param_type {
        ParamType::Boolean => boolean_arg(base, flag, param.default.as_ref()),
        kind => valued_arg(base, flag, kind, param.default.as_ref()),
    };
    if param.name == TARGET_PARAM {
        shaped.short(TARGET_SHORT)
    } else {
        shaped
    }
}

fn boolean_arg(arg: Arg, flag: String, default: Option<&Value>) -> Arg {
    match default.map(truthy) {
        Some(true) => arg.long(format!("no-{flag}")).action(ArgAction::SetFalse),
        Some(false) => arg.long(flag).action(ArgAction::SetTrue),
        None => arg.long(flag).action(ArgAction::SetTrue).required(true),
    }
}

fn valued_arg(arg: Arg, flag: String, kind: ParamType, default: Option<&Value>) -> Arg {
    let named = arg
        .long(flag)
        .action(ArgAction::Set)
        .value_name(value_name(kind));
    let typed = match kind {
        ParamType::Integer => named
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true),
        ParamType::Float => named
            .value_parser(value_parser!(f64))
            .allow_negative_numbers(true),
        ParamType::String | ParamType::Boolean => named.value_parser(value_parser!(String)),
    };
    match default.map(rendered_default) {
        None => typed.required(true),
        Some(Some(text)) => typed.default_value(text),
        Some(None) => typed,
    }
}

const fn value_name(kind: ParamType) -> &'static str {
    match kind {
        ParamType::Integer => "INT",
        ParamType::Float => "FLOAT",
        ParamType::String | ParamType::Boolean => "TEXT",
    }
}

/// Defaults shown in help. Null and empty text are left to the binder.
fn rendered_default(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Binds matched values for `spec`, falling back to declared defaults.
pub(crate) fn bind_arguments(spec: &CommandSpec, matches: &ArgMatches) -> Arguments {
    let mut arguments = Arguments::default();
    for param in &spec.params {
        let name = param.name.as_str();
        let matched = match param.param_type {
            ParamType::Boolean => matches.get_one::<bool>(name).copied().map(Value::Bool),
            ParamType::Integer => matches.get_one::<i64>(name).copied().map(Value::from),
            ParamType::Float => matches.get_one::<f64>(name).copied().map(Value::from),
            ParamType::String => matches.get_one::<String>(name).cloned().map(Value::String),
        };
        let value = matched
            .or_else(|| param.default.clone())
            .unwrap_or(Value::Null);
        arguments.insert(name, value);
    }
    arguments
}

/// Rebuilds the top-level configuration flags as an argument list for the
/// configuration loader, starting with the binary name.
pub(crate) fn config_arguments(matches: &ArgMatches) -> Vec<OsString> {
    let mut args = vec![OsString::from(BIN_NAME)];
    for (id, flag) in CONFIG_FLAGS {
        if let Some(value) = matches.get_one::<String>(id) {
            args.push(OsString::from(*flag));
            args.push(OsString::from(value));
        }
    }
    args
}
