//! CLI entrypoint for the action dispatcher.
//!
//! Delegates to [`actuate_cli::run`], which parses arguments, loads
//! configuration, dispatches one request, and prints its result envelope.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    actuate_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
