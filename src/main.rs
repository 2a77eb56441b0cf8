//! Binary entry point: parse arguments, bring up logging, open the SQLite
//! store and run one command as the acting user.
mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use cli::{Cli, OutputFormat};
use gradebook::error::exit_code_for;
use gradebook::logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref()) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    match commands::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code_for(&err);
            tracing::debug!(error = ?err, "command failed");
            if cli.format == OutputFormat::Json {
                eprintln!(
                    "{}",
                    json!({ "error": format!("{err:#}"), "exit_code": code as u8 })
                );
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(u8::from(code))
        }
    }
}
