//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the lf CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// lf - Filter tagged lists the way a filter form on the page would
#[derive(Parser, Debug)]
#[command(name = "lf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (default: ~/.config/listfilter/config.toml)
    #[arg(long, global = true, env = "LISTFILTER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bind the filters of a page, replay interactions and show what is visible
    #[command(alias = "r")]
    Run {
        /// Page markup as JSON
        page: PathBuf,

        /// Page URL; its query seeds the filter controls
        #[arg(short, long, default_value = "/")]
        url: String,

        /// Only act on and report this filter instance
        #[arg(short, long)]
        instance: Option<String>,

        /// Clear every control before replaying interactions
        #[arg(long)]
        reset: bool,

        /// Choose an option of a single-choice key (KEY=VALUE, empty VALUE clears)
        #[arg(short, long, value_name = "KEY=VALUE", action = clap::ArgAction::Append)]
        select: Vec<String>,

        /// Flip the enabled toggle of a multi-choice key
        #[arg(short, long, value_name = "KEY", action = clap::ArgAction::Append)]
        toggle: Vec<String>,

        /// Flip one value toggle of a multi-choice key
        #[arg(long, value_name = "KEY=VALUE", action = clap::ArgAction::Append)]
        toggle_value: Vec<String>,

        /// Flip the OR/AND toggle of a multi-choice key
        #[arg(long, value_name = "KEY", action = clap::ArgAction::Append)]
        toggle_relation: Vec<String>,

        /// Print the resulting page markup
        #[arg(long)]
        dump: bool,
    },

    /// Decode a filter query string
    Decode {
        /// Query string, with or without the leading '?'
        query: String,
    },

    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Supported shells for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command() {
        let cli = Cli::parse_from(["lf"]);
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["lf", "decode", "a=b", "--json", "--no-color", "-v"]);
        assert!(cli.json);
        assert!(cli.no_color);
        assert!(cli.verbose);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["lf", "-v", "-q", "decode", "a=b"]).is_err());
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["lf", "run", "page.json"]);
        if let Some(Commands::Run {
            page,
            url,
            instance,
            reset,
            select,
            dump,
            ..
        }) = cli.command
        {
            assert_eq!(page, PathBuf::from("page.json"));
            assert_eq!(url, "/");
            assert!(instance.is_none());
            assert!(!reset);
            assert!(select.is_empty());
            assert!(!dump);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_run_repeated_interactions() {
        let cli = Cli::parse_from([
            "lf",
            "run",
            "page.json",
            "--url",
            "/shop?color=red",
            "--select",
            "color=blue",
            "-s",
            "material=",
            "--toggle",
            "size",
            "--toggle-value",
            "size=S",
            "--toggle-value",
            "size=M",
            "--toggle-relation",
            "size",
        ]);
        if let Some(Commands::Run {
            url,
            select,
            toggle,
            toggle_value,
            toggle_relation,
            ..
        }) = cli.command
        {
            assert_eq!(url, "/shop?color=red");
            assert_eq!(select, vec!["color=blue", "material="]);
            assert_eq!(toggle, vec!["size"]);
            assert_eq!(toggle_value, vec!["size=S", "size=M"]);
            assert_eq!(toggle_relation, vec!["size"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_run_alias() {
        let cli = Cli::parse_from(["lf", "r", "page.json"]);
        assert!(matches!(cli.command, Some(Commands::Run { .. })));
    }

    #[test]
    fn test_config_flag() {
        let cli = Cli::parse_from(["lf", "--config", "/tmp/lf.toml", "config", "path"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/lf.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: Some(ConfigCommands::Path)
            })
        ));
    }

    #[test]
    fn test_config_init_force() {
        let cli = Cli::parse_from(["lf", "config", "init", "--force"]);
        if let Some(Commands::Config {
            command: Some(ConfigCommands::Init { force }),
        }) = cli.command
        {
            assert!(force);
        } else {
            panic!("Expected Config Init command");
        }
    }

    #[test]
    fn test_completions() {
        let cli = Cli::parse_from(["lf", "completions", "zsh"]);
        if let Some(Commands::Completions { shell }) = cli.command {
            assert!(matches!(shell, Shell::Zsh));
        } else {
            panic!("Expected Completions command");
        }
    }
}
