//! Tracing subscriber initialization for the lf binary.
//!
//! Logs go to stderr so they never mix with table or JSON output.
//!
//! # Priority (highest to lowest)
//!
//! 1. `LISTFILTER_LOG` env var (per-target directives, e.g. `listfilter_engine=debug,warn`)
//! 2. `RUST_LOG` env var
//! 3. CLI flags (`-v` → debug, `-q` → error)
//! 4. Default level: `warn`

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Env var holding project-specific filter directives.
const LOG_ENV: &str = "LISTFILTER_LOG";

/// Crates raised to debug in verbose mode.
const VERBOSE_TARGETS: [&str; 3] = ["listfilter_engine", "listfilter_page", "lf"];

/// Verbosity level derived from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// `--quiet` / `-q`: only errors.
    Quiet,
    /// Default: warnings and above.
    Normal,
    /// `--verbose` / `-v`: debug-level output.
    Verbose,
}

impl Verbosity {
    /// Determine verbosity from the parsed CLI flags.
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Map to a default `tracing::Level`.
    #[must_use]
    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Must be called once, before config loading, so config traces are captured.
/// A second call is ignored.
pub fn init_subscriber(verbosity: Verbosity, no_color: bool) {
    let filter = build_env_filter(verbosity, std::env::var(LOG_ENV).ok().as_deref());

    let stderr_is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let use_ansi = !no_color && stderr_is_tty;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true);

    // Verbose mode gets timestamps; normal and quiet stay compact.
    let result = if verbosity == Verbosity::Verbose {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.with_timer(fmt::time::uptime()))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.without_time().compact())
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}

/// Builds an `EnvFilter` from `LISTFILTER_LOG` (passed in), then `RUST_LOG`,
/// then the verbosity default.
///
/// Unparseable directives fall through to the next source.
fn build_env_filter(verbosity: Verbosity, project_directives: Option<&str>) -> EnvFilter {
    if let Some(directives) = project_directives {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(default_directive(verbosity))
}

/// Directive string for a verbosity when no env var is set.
fn default_directive(verbosity: Verbosity) -> String {
    let level = verbosity.default_level();
    if verbosity == Verbosity::Verbose {
        let targets: Vec<String> = VERBOSE_TARGETS
            .iter()
            .map(|target| format!("{target}=debug"))
            .collect();
        format!("{level},{}", targets.join(","))
    } else {
        level.to_string()
    }
}
