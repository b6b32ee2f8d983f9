//! In-crate behavioural and runtime tests for the CLI.

mod behaviour;
mod support;
mod unit;
