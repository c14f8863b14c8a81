//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Commands split by whether they need the filter configuration: `run` binds
//! pages and loads it first, the rest work without it.

use std::path::Path;

use crate::cli::{Cli, Commands, ConfigCommands, Shell};
use crate::commands::config::load_config;
use crate::commands::run::RunOptions;
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for commands that can be executed without the filter configuration.
pub trait StandaloneCommand {
    /// Execute the command.
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// Trait for commands that bind pages and need the filter configuration.
pub trait ConfiguredCommand {
    /// Load the configuration and execute the command.
    fn execute(&self, ctx: &CommandContext, config_path: Option<&Path>) -> Result<()>;
}

/// Commands that don't need the filter configuration.
pub enum StandaloneDispatch<'a> {
    Config {
        command: &'a Option<ConfigCommands>,
        config_path: Option<&'a Path>,
    },
    Completions(&'a Shell),
    Decode(&'a str),
    Help,
}

impl<'a> StandaloneDispatch<'a> {
    /// Try to create a standalone dispatch from the CLI command.
    /// Returns None if the command needs the filter configuration.
    pub fn try_from_cli(cli: &'a Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Config { command }) => Some(Self::Config {
                command,
                config_path: cli.config.as_deref(),
            }),
            Some(Commands::Completions { shell }) => Some(Self::Completions(shell)),
            Some(Commands::Decode { query }) => Some(Self::Decode(query)),
            None => Some(Self::Help),
            Some(Commands::Run { .. }) => None,
        }
    }
}

impl StandaloneCommand for StandaloneDispatch<'_> {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            Self::Config {
                command,
                config_path,
            } => dispatch_config(ctx, command, *config_path),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Decode(query) => commands::decode::execute(ctx, query),
            Self::Help => {
                if !ctx.quiet {
                    println!("lf - list filter");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(
    ctx: &CommandContext,
    command: &Option<ConfigCommands>,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx, config_path),
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx, config_path),
        Some(ConfigCommands::Init { force }) => {
            commands::config::execute_init(ctx, config_path, *force)
        }
    }
}

/// Commands that need the filter configuration.
pub enum ConfiguredDispatch {
    Run(RunOptions),
}

impl ConfiguredDispatch {
    /// Create a configured dispatch from the CLI command.
    pub fn from_cli(cli: &Cli) -> Option<Self> {
        match &cli.command {
            Some(Commands::Run {
                page,
                url,
                instance,
                reset,
                select,
                toggle,
                toggle_value,
                toggle_relation,
                dump,
            }) => Some(Self::Run(RunOptions {
                page: page.clone(),
                url: url.clone(),
                instance: instance.clone(),
                reset: *reset,
                select: select.clone(),
                toggle: toggle.clone(),
                toggle_value: toggle_value.clone(),
                toggle_relation: toggle_relation.clone(),
                dump: *dump,
            })),
            _ => None,
        }
    }
}

impl ConfiguredCommand for ConfiguredDispatch {
    fn execute(&self, ctx: &CommandContext, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        match self {
            Self::Run(opts) => commands::run::execute(ctx, &config, opts),
        }
    }
}
