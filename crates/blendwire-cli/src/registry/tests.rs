//! Registration and doc extraction tests.

use blendwire_rpc::RpcClient;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::dispatch::{Arguments, CommandError};

fn local_body(_: &CommandContext<'_>, _: &Arguments) -> Result<Value, CommandError> {
    Ok(json!({ "ok": true }))
}

fn remote_body(
    _: &CommandContext<'_>,
    _: &RpcClient,
    _: &Arguments,
) -> Result<Value, CommandError> {
    Ok(json!({ "ok": true }))
}

fn remote(function: &'static str, doc: &'static str, params: Vec<ParamDecl>) -> CommandDecl {
    let mut all = vec![ParamDecl::client()];
    all.extend(params);
    CommandDecl {
        function,
        doc,
        params: all,
        handler: Handler::Remote(remote_body),
    }
}

fn local(function: &'static str, doc: &'static str, params: Vec<ParamDecl>) -> CommandDecl {
    CommandDecl {
        function,
        doc,
        params,
        handler: Handler::Local(local_body),
    }
}

#[rstest]
fn extracts_name_summary_and_parameters() {
    let spec = extract(remote(
        "render_viewport",
        "Render the viewport.

         :param output_path: Where to write the image.
         :param width: Width in pixels.",
        vec![
            ParamDecl::required("output_path", TypeHint::Str),
            ParamDecl::optional("width", TypeHint::Int, 1920),
        ],
    ))
    .expect("extract");

    assert_eq!(spec.name, "render-viewport");
    assert_eq!(spec.summary, "Render the viewport.");
    assert!(spec.needs_client);
    assert_eq!(spec.params.len(), 2);
    let width = spec.param("width").expect("width param");
    assert_eq!(width.param_type, ParamType::Integer);
    assert_eq!(width.default, Some(json!(1920)));
    assert_eq!(width.help_text, "Width in pixels.");
    assert!(!spec.param("output_path").expect("output_path").has_default());
}

#[rstest]
fn undocumented_parameter_is_rejected_by_name() {
    let error = extract(remote(
        "render_viewport",
        "Render the viewport.

         :param output_path: Where to write the image.",
        vec![
            ParamDecl::required("output_path", TypeHint::Str),
            ParamDecl::optional("width", TypeHint::Int, 1920),
        ],
    ))
    .expect_err("width is undocumented");

    assert_eq!(
        error,
        RegistryError::MissingParamDoc {
            command: String::from("render-viewport"),
            parameter: String::from("width"),
        }
    );
}

#[rstest]
#[case::empty("")]
#[case::blank("   \n  ")]
#[case::params_only(":param code: Python source.")]
fn documentation_needs_a_summary(#[case] doc: &'static str) {
    let error = extract(local("execute", doc, Vec::new())).expect_err("no summary");
    assert!(matches!(error, RegistryError::MissingSummary { .. }));
}

#[rstest]
fn repeated_parameter_is_rejected() {
    let error = extract(local(
        "echo",
        "Echo a value.\n:param value: The value.",
        vec![
            ParamDecl::required("value", TypeHint::Str),
            ParamDecl::required("value", TypeHint::Int),
        ],
    ))
    .expect_err("duplicate parameter");
    assert!(matches!(error, RegistryError::DuplicateParameter { parameter, .. } if parameter == "value"));
}

#[rstest]
fn client_parameter_requires_a_remote_handler() {
    let decl = CommandDecl {
        handler: Handler::Local(local_body),
        ..remote("health", "Check the server.", Vec::new())
    };
    let error = extract(decl).expect_err("mismatch");
    assert!(matches!(error, RegistryError::HandlerMismatch { .. }));
}

#[rstest]
fn remote_handler_requires_a_client_parameter() {
    let decl = CommandDecl {
        handler: Handler::Remote(remote_body),
        ..local("health", "Check the server.", Vec::new())
    };
    let error = extract(decl).expect_err("mismatch");
    assert!(matches!(error, RegistryError::HandlerMismatch { .. }));
}

#[rstest]
fn colliding_cli_names_are_rejected() {
    let error = Registry::from_declarations([
        local("get_mesh", "First.", Vec::new()),
        local("get-mesh", "Second.", Vec::new()),
    ])
    .expect_err("names collide");

    assert_eq!(
        error,
        RegistryError::DuplicateCommand {
            name: String::from("get-mesh"),
            existing: String::from("get_mesh"),
            duplicate: String::from("get-mesh"),
        }
    );
}

#[rstest]
#[case::text(TypeHint::Str, ParamType::String)]
#[case::int(TypeHint::Int, ParamType::Integer)]
#[case::float(TypeHint::Float, ParamType::Float)]
#[case::boolean(TypeHint::Bool, ParamType::Boolean)]
#[case::optional_int(TypeHint::optional(TypeHint::Int), ParamType::Integer)]
#[case::union_with_none(
    TypeHint::Union(vec![TypeHint::Float, TypeHint::NoneType]),
    ParamType::Float
)]
#[case::wide_union(
    TypeHint::Union(vec![TypeHint::Int, TypeHint::Str]),
    ParamType::String
)]
#[case::only_none(TypeHint::Union(vec![TypeHint::NoneType]), ParamType::String)]
#[case::named(TypeHint::Named(String::from("Path")), ParamType::String)]
fn type_hints_normalise(#[case] hint: TypeHint, #[case] expected: ParamType) {
    assert_eq!(hint.normalise(), expected);
}

#[rstest]
fn description_drops_parameter_lines() {
    let spec = extract(local(
        "echo",
        "Echo a value.

         Prints it back unchanged.
         :param value: The value.",
        vec![ParamDecl::required("value", TypeHint::Str)],
    ))
    .expect("extract");
    assert_eq!(spec.description(), "Echo a value.\n\nPrints it back unchanged.");
}

#[rstest]
fn iteration_follows_name_order() {
    let registry = Registry::from_declarations([
        local("zeta", "Last.", Vec::new()),
        local("alpha", "First.", Vec::new()),
    ])
    .expect("registry");
    let names: Vec<&str> = registry.iter().map(|spec| spec.name.as_str()).collect();
    assert_eq!(names, ["alpha", "zeta"]);
}

#[rstest]
fn builtin_commands_register_cleanly() {
    let registry = Registry::with_builtin_commands().expect("builtin registry");
    for name in [
        "start",
        "shutdown",
        "restart",
        "status",
        "health",
        "ping",
        "execute",
        "apply-node-group",
        "render-viewport",
        "get-mesh-metrics",
        "list-commands",
    ] {
        assert!(registry.get(name).is_some(), "missing command {name}");
    }
    assert!(
        registry
            .iter()
            .flat_map(|spec| &spec.params)
            .all(|param| !param.help_text.is_empty())
    );
    assert!(!registry.get("list-commands").expect("list").needs_client);
}
