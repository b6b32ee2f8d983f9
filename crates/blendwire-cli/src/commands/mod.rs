//! Built-in commands.
//!
//! Each command is a function plus a [`CommandDecl`] describing it; the
//! registry turns the declarations into CLI subcommands.

mod host;
mod local;
mod remote;

use crate::registry::CommandDecl;

/// Every built-in declaration, in no particular order.
pub(crate) fn declarations() -> Vec<CommandDecl> {
    vec![
        host::start(),
        host::shutdown(),
        host::restart(),
        host::status(),
        remote::health(),
        remote::ping(),
        remote::execute(),
        remote::apply_node_group(),
        remote::render_viewport(),
        remote::get_mesh_metrics(),
        local::list_commands(),
    ]
}
