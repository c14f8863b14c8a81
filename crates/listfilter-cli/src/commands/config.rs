//! Config command implementation.
//!
//! View and initialize configuration settings.
//! Config file is located at ~/.config/listfilter/config.toml.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use listfilter_engine::FilterConfig;
use tracing::debug;

use super::{CommandContext, CommandError, Result};

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# lf - list filter configuration

# Config schema version (do not modify)
version = 1

# Seed control state from the page URL when binding
# init_from_url = true

# Write heading depth (from h1..h6 rank) into the depth attribute when binding
# assign_heading_depth = true

# Replace '_' with '-' in derived tag names
# normalize_underscores = true

# Per-key URL variable and tag templates
[templates]
# url_var = "%key%"
# tag = "%key%-%value%"

# Which elements play which role
[selectors]
# filter = ".list-filter"
# list = ".list-filter-target"
# key = "[data-filter-key]"
# select = "select"
# enabled = "input.filter-enabled"
# relation = "input.filter-relation"
# values = "input.filter-value"
# heading = "h1,h2,h3,h4,h5,h6"
# block = "ul,ol"
# item = "li"

# Structural attribute names
[attributes]
# instance = "data-filter-id"
# key = "data-filter-key"
# url_var = "data-url-var"
# tag_pattern = "data-tag-pattern"
# count = "data-count"
# depth = "data-depth"
"#;

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/listfilter/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg_config).join("listfilter"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("listfilter"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
///
/// An explicit path (`--config` or `LISTFILTER_CONFIG`) wins over the XDG location.
pub fn get_config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk; a missing file yields the defaults.
pub fn load_config(override_path: Option<&Path>) -> Result<FilterConfig> {
    let path = get_config_path(override_path)?;

    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(FilterConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config = FilterConfig::from_toml_str(&content).map_err(|e| {
        CommandError::Config(format!("Failed to load {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext, override_path: Option<&Path>) -> Result<()> {
    let config = load_config(override_path)?;
    let path = get_config_path(override_path)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        let rendered = config
            .to_toml_string()
            .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;
        println!("{}", rendered.trim_end());

        if !path.exists() {
            println!("\n(No config file exists. Run 'lf config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext, override_path: Option<&Path>) -> Result<()> {
    let path = get_config_path(override_path)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command.
pub fn execute_init(ctx: &CommandContext, override_path: Option<&Path>, force: bool) -> Result<()> {
    let path = get_config_path(override_path)?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CommandError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "created",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created config at {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn quiet_ctx() -> CommandContext {
        CommandContext {
            json_output: false,
            use_colors: false,
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn test_default_config_parses_to_defaults() {
        let config = FilterConfig::from_toml_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn test_override_path_wins() {
        let path = PathBuf::from("/tmp/lf-test/custom.toml");
        assert_eq!(get_config_path(Some(path.as_path())).unwrap(), path);
    }

    #[test]
    #[serial]
    fn test_xdg_config_home() {
        let temp_dir = TempDir::new().unwrap();
        let original = env::var_os("XDG_CONFIG_HOME");
        env::set_var("XDG_CONFIG_HOME", temp_dir.path());

        let result = get_config_path(None);

        match original {
            Some(val) => env::set_var("XDG_CONFIG_HOME", val),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(
            result.unwrap(),
            temp_dir.path().join("listfilter").join("config.toml")
        );
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nope.toml");
        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn test_load_custom_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "init_from_url = false\n[attributes]\ncount = \"data-n\"\n").unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert!(!config.init_from_url);
        assert_eq!(config.attributes.count, "data-n");
        assert_eq!(config.templates, FilterConfig::default().templates);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[selectors]\nitem = \"li > a\"\n").unwrap();

        let err = load_config(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_init_writes_default_and_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let ctx = quiet_ctx();

        execute_init(&ctx, Some(path.as_path()), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        let err = execute_init(&ctx, Some(path.as_path()), false).unwrap_err();
        assert!(err.to_string().contains("--force"));

        fs::write(&path, "version = 1\ninit_from_url = false\n").unwrap();
        execute_init(&ctx, Some(path.as_path()), true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
