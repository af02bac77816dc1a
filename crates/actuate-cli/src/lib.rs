//! Command-line driver for the action dispatch core.
//!
//! One invocation dispatches one request. The request is given as a JSON
//! argument or read from standard input, the result envelope is printed as
//! a single JSON line on stdout, and logs go to stderr. The exit status is
//! 0 on success, 1 when the action failed, and 2 for internal failures,
//! including set-up errors such as an unreadable configuration file.
//!
//! Ctrl-C cancels the in-flight action; cancellable actions then report a
//! `Cancelled` envelope.

mod cli;
mod errors;

use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::ExitCode;

use actuate_config::{ConfigLoader, SystemConfigLoader};
use actuate_core::{CancellationToken, Dispatcher, ResultEnvelope, telemetry};
use clap::Parser;
use tokio::runtime::Builder;
use tracing::debug;

use cli::Cli;
pub use errors::CliError;

const CLI_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::run");

/// Runs the CLI with the supplied arguments and IO streams.
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let stream: &mut dyn Write = if error.use_stderr() { stderr } else { stdout };
            // Help and version output go to stdout with status 0.
            let _ = write!(stream, "{}", error.render());
            return exit_code(error.exit_code());
        }
    };

    match execute(&cli, stdin, stdout) {
        Ok(envelope) => exit_code(envelope.exit_status()),
        Err(error) => {
            let _ = writeln!(stderr, "actuate: {error}");
            exit_code(error.exit_status())
        }
    }
}

fn execute<R, W>(cli: &Cli, stdin: &mut R, stdout: &mut W) -> Result<ResultEnvelope, CliError>
where
    R: Read,
    W: Write,
{
    let config = SystemConfigLoader::with_args(cli.config_arguments())
        .load()
        .map_err(CliError::Config)?;
    telemetry::initialise(&config)?;

    let request = read_request(cli, stdin)?;
    let dispatcher = Dispatcher::new(&config)?;
    debug!(target: CLI_TARGET, root = %dispatcher.root().display(), "dispatcher ready");

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let envelope = runtime.block_on(dispatch_with_interrupt(&dispatcher, &request));

    let line = envelope.to_json_line()?;
    writeln!(stdout, "{line}").map_err(CliError::Output)?;
    stdout.flush().map_err(CliError::Output)?;
    Ok(envelope)
}

fn read_request<R: Read>(cli: &Cli, stdin: &mut R) -> Result<Vec<u8>, CliError> {
    if !cli.reads_stdin() {
        return Ok(cli.request.clone().into_bytes());
    }
    let mut buffer = Vec::new();
    stdin.read_to_end(&mut buffer).map_err(CliError::Input)?;
    Ok(buffer)
}

async fn dispatch_with_interrupt(dispatcher: &Dispatcher, request: &[u8]) -> ResultEnvelope {
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!(target: CLI_TARGET, "interrupt received, cancelling action");
            watcher.cancel();
        }
    });
    let envelope = dispatcher.dispatch_line(request, &cancel).await;
    interrupt.abort();
    envelope
}

fn exit_code(status: i32) -> ExitCode {
    ExitCode::from(u8::try_from(status).unwrap_or(2))
}
