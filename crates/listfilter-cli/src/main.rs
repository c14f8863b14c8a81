use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod dispatch;
mod output;
mod tracing_setup;

use cli::Cli;
use commands::{CommandContext, CommandError};
use dispatch::{ConfiguredCommand, ConfiguredDispatch, StandaloneCommand, StandaloneDispatch};
use tracing_setup::{init_subscriber, Verbosity};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet), cli.no_color);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                let rendered = serde_json::to_string_pretty(&error_json)
                    .unwrap_or_else(|_| error_json.to_string());
                eprintln!("{rendered}");
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    if let Some(dispatch) = StandaloneDispatch::try_from_cli(cli) {
        return dispatch.execute(&ctx);
    }

    match ConfiguredDispatch::from_cli(cli) {
        Some(dispatch) => dispatch.execute(&ctx, cli.config.as_deref()),
        None => Ok(()),
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Page(_) => "PAGE_ERROR",
        CommandError::Binding(_) => "BINDING_ERROR",
        CommandError::NotFound(_) => "NOT_FOUND",
        CommandError::InvalidArgument(_) => "INVALID_ARGUMENT",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Config(_) => ExitCode::from(5),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Binding(_) | CommandError::NotFound(_) => ExitCode::from(2),
        CommandError::Page(_) | CommandError::InvalidArgument(_) | CommandError::Json(_) => {
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listfilter_engine::BindingError;

    #[test]
    fn test_error_codes() {
        let binding = CommandError::Binding(BindingError::missing_filter_root("x"));
        assert_eq!(error_code(&binding), "BINDING_ERROR");
        assert_eq!(
            error_code(&CommandError::InvalidArgument("k".to_string())),
            "INVALID_ARGUMENT"
        );
        assert_eq!(error_code(&CommandError::Config("c".to_string())), "CONFIG_ERROR");
    }
}
