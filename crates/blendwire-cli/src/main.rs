//! CLI entrypoint for blendwire.
//!
//! The binary delegates to [`blendwire_cli::run`], which parses the command
//! line, dispatches the selected command, and prints its JSON envelope.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    blendwire_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
