//! Command registry.
//!
//! Commands are declared in [`crate::commands`], pass through the doc
//! extractor, and land here keyed by their CLI name. The process-wide
//! registry is built once, on first use.

mod error;
mod extract;
mod model;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use once_cell::sync::OnceCell;

pub use error::RegistryError;
pub use extract::extract;
pub use model::{
    CLIENT_PARAM, CommandContext, CommandDecl, CommandSpec, Handler, LocalFn, ParamDecl,
    ParamType, ParameterSpec, RemoteFn, TypeHint,
};

static GLOBAL: OnceCell<Registry> = OnceCell::new();

/// Mapping from CLI name to command spec, iterated in name order.
#[derive(Debug, Default)]
pub struct Registry {
    commands: BTreeMap<String, CommandSpec>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a batch of declarations.
    ///
    /// # Errors
    ///
    /// Returns the first extraction or name collision error.
    pub fn from_declarations(
        declarations: impl IntoIterator<Item = CommandDecl>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for decl in declarations {
            registry.register(decl)?;
        }
        Ok(registry)
    }

    /// Registers every built-in command.
    ///
    /// # Errors
    ///
    /// Returns an error when a built-in declaration is malformed.
    pub fn with_builtin_commands() -> Result<Self, RegistryError> {
        Self::from_declarations(crate::commands::declarations())
    }

    /// Returns the process-wide registry, building it on first access.
    ///
    /// # Errors
    ///
    /// Returns the registration error; a later call retries the build.
    pub fn global() -> Result<&'static Self, RegistryError> {
        GLOBAL.get_or_try_init(Self::with_builtin_commands)
    }

    /// Extracts and inserts one declaration.
    ///
    /// # Errors
    ///
    /// Fails when the declaration is malformed or its CLI name is taken.
    pub fn register(&mut self, decl: CommandDecl) -> Result<(), RegistryError> {
        let spec = extract(decl)?;
        match self.commands.entry(spec.name.clone()) {
            Entry::Occupied(existing) => Err(RegistryError::DuplicateCommand {
                name: spec.name,
                existing: existing.get().function.to_owned(),
                duplicate: spec.function.to_owned(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(spec);
                Ok(())
            }
        }
    }

    /// Looks up a command by CLI name.
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    /// Iterates commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests;
