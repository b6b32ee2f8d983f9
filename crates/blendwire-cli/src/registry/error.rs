//! Registration failures.

use thiserror::Error;

/// Raised while turning declarations into command specs.
///
/// Every variant is a programming error in a command declaration and aborts
/// startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The documentation has no summary line.
    #[error("command '{function}' has no documentation summary")]
    MissingSummary {
        /// Declared function name.
        function: String,
    },
    /// A parameter lacks a `:param` line.
    #[error("command '{command}' does not document parameter '{parameter}'")]
    MissingParamDoc {
        /// CLI name of the command.
        command: String,
        /// Undocumented parameter.
        parameter: String,
    },
    /// A parameter name repeats within one command.
    #[error("command '{command}' declares parameter '{parameter}' more than once")]
    DuplicateParameter {
        /// CLI name of the command.
        command: String,
        /// Repeated parameter.
        parameter: String,
    },
    /// Two declarations normalise to the same CLI name.
    #[error("command name '{name}' is registered by both '{existing}' and '{duplicate}'")]
    DuplicateCommand {
        /// Colliding CLI name.
        name: String,
        /// Function already holding the name.
        existing: String,
        /// Function that tried to claim it.
        duplicate: String,
    },
    /// The leading client parameter and the handler kind disagree.
    #[error("command '{command}' {reason}")]
    HandlerMismatch {
        /// CLI name of the command.
        command: String,
        /// What disagrees.
        reason: &'static str,
    },
}
