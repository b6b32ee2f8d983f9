//! Normalised command and parameter descriptions.
//!
//! [`CommandDecl`] is what a command module writes by hand; the doc extractor
//! turns it into an immutable [`CommandSpec`] once registration succeeds.

use std::fmt;

use blendwire_config::Config;
use blendwire_rpc::RpcClient;
use serde_json::Value;

use super::Registry;
use crate::dispatch::{Arguments, CommandError};

/// Reserved name of the leading parameter that receives the RPC client.
pub const CLIENT_PARAM: &str = "client";

/// The four value kinds a CLI flag can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Free-form text.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Flag without a value.
    Boolean,
}

impl fmt::Display for ParamType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => formatter.write_str("string"),
            Self::Integer => formatter.write_str("integer"),
            Self::Float => formatter.write_str("float"),
            Self::Boolean => formatter.write_str("boolean"),
        }
    }
}

/// Declared type of a parameter before normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    /// Text.
    Str,
    /// Integer.
    Int,
    /// Float.
    Float,
    /// Boolean.
    Bool,
    /// The null type; only meaningful inside `Optional` or `Union`.
    NoneType,
    /// A value that may be absent.
    Optional(Box<TypeHint>),
    /// One of several alternatives.
    Union(Vec<TypeHint>),
    /// Any other named type.
    Named(String),
}

impl TypeHint {
    /// Shorthand for `Optional(inner)`.
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Collapses the hint to one of the four flag kinds.
    ///
    /// Optional and union hints reduce to their single non-null alternative;
    /// anything without exactly one such alternative falls back to text.
    pub fn normalise(&self) -> ParamType {
        match self {
            Self::Str | Self::NoneType | Self::Named(_) => ParamType::String,
            Self::Int => ParamType::Integer,
            Self::Float => ParamType::Float,
            Self::Bool => ParamType::Boolean,
            Self::Optional(inner) => inner.normalise(),
            Self::Union(alternatives) => {
                let mut concrete = alternatives
                    .iter()
                    .filter(|alternative| **alternative != Self::NoneType);
                match (concrete.next(), concrete.next()) {
                    (Some(single), None) => single.normalise(),
                    _ => ParamType::String,
                }
            }
        }
    }
}

/// One declared parameter of a command function.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    /// Parameter name; becomes the flag name with `_` replaced by `-`.
    pub name: &'static str,
    /// Declared type.
    pub hint: TypeHint,
    /// Default value; `None` makes the flag mandatory.
    pub default: Option<Value>,
}

impl ParamDecl {
    /// A parameter without a default.
    pub const fn required(name: &'static str, hint: TypeHint) -> Self {
        Self {
            name,
            hint,
            default: None,
        }
    }

    /// A parameter with a default.
    pub fn optional(name: &'static str, hint: TypeHint, default: impl Into<Value>) -> Self {
        Self {
            name,
            hint,
            default: Some(default.into()),
        }
    }

    /// The reserved leading parameter that receives the RPC client.
    pub fn client() -> Self {
        Self::required(CLIENT_PARAM, TypeHint::Named(String::from("RpcClient")))
    }
}

/// Shared state handed to every command body.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// Resolved configuration for this invocation.
    pub config: &'a Config,
    /// The registry the command was dispatched from.
    pub registry: &'a Registry,
}

/// Body of a command that does not talk to the host.
pub type LocalFn = fn(&CommandContext<'_>, &Arguments) -> Result<Value, CommandError>;

/// Body of a command that receives the RPC client.
pub type RemoteFn = fn(&CommandContext<'_>, &RpcClient, &Arguments) -> Result<Value, CommandError>;

/// The callable behind a command.
#[derive(Clone, Copy)]
pub enum Handler {
    /// Called with the bound arguments only.
    Local(LocalFn),
    /// Called with an RPC client scoped to the invocation.
    Remote(RemoteFn),
}

impl Handler {
    /// Returns true when the handler expects an RPC client.
    pub const fn takes_client(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(_) => formatter.write_str("Handler::Local"),
            Self::Remote(_) => formatter.write_str("Handler::Remote"),
        }
    }
}

/// Hand-written declaration of one command: its function name, structured
/// documentation, ordered parameters, and body.
#[derive(Debug, Clone)]
pub struct CommandDecl {
    /// Function name; the CLI name replaces `_` with `-`.
    pub function: &'static str,
    /// A summary line followed by one `:param <name>: <text>` line per
    /// parameter.
    pub doc: &'static str,
    /// Parameters in declaration order.
    pub params: Vec<ParamDecl>,
    /// Command body.
    pub handler: Handler,
}

/// One input of a registered command.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// Identifier, unique within the command.
    pub name: String,
    /// Normalised value kind.
    pub param_type: ParamType,
    /// Value used when the flag is omitted; `None` makes it mandatory.
    pub default: Option<Value>,
    /// Non-empty description taken from the `:param` line.
    pub help_text: String,
}

impl ParameterSpec {
    /// Whether omitting the flag is legal.
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Long flag name without leading dashes.
    pub fn flag_name(&self) -> String {
        self.name.replace('_', "-")
    }
}

/// A registered command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// CLI-visible name, unique across the registry.
    pub name: String,
    /// Function name the command was declared with.
    pub function: &'static str,
    /// Command body.
    pub handler: Handler,
    /// Whether the body receives an RPC client.
    pub needs_client: bool,
    /// First line of the documentation.
    pub summary: String,
    /// Full documentation block.
    pub doc_text: String,
    /// Parameters in declaration order, client excluded.
    pub params: Vec<ParameterSpec>,
}

impl CommandSpec {
    /// Documentation without the `:param` lines, for long help.
    pub fn description(&self) -> String {
        self.doc_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with(":param"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_owned()
    }

    /// Looks up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|param| param.name == name)
    }
}
