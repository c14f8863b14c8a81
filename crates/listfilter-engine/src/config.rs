//! Filter configuration.
//!
//! Every option has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! # listfilter configuration
//! version = 1
//!
//! # Seed control state from the page URL when binding
//! init_from_url = true
//!
//! # Write heading depth (from h1..h6 rank) into the depth attribute at bind time
//! assign_heading_depth = true
//!
//! # Replace '_' with '-' in derived tag names
//! normalize_underscores = true
//!
//! [templates]
//! url_var = "%key%"
//! tag = "%key%-%value%"
//!
//! [selectors]
//! filter = ".list-filter"
//! list = ".list-filter-target"
//!
//! [attributes]
//! count = "data-count"
//! ```

use listfilter_page::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Current config schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Complete configuration for discovering and binding filter instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Config schema version.
    pub version: u32,

    /// Derive heading depth from heading rank when a list is bound.
    pub assign_heading_depth: bool,

    /// Seed control state from the current URL when an instance is bound.
    pub init_from_url: bool,

    /// Replace `_` with `-` in derived tag names.
    pub normalize_underscores: bool,

    /// Which elements play which role.
    pub selectors: Selectors,

    /// Base templates for per-key URL variables and tags.
    pub templates: Templates,

    /// Names of the structural attributes read and written by the engine.
    pub attributes: Attributes,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            assign_heading_depth: true,
            init_from_url: true,
            normalize_underscores: true,
            selectors: Selectors::default(),
            templates: Templates::default(),
            attributes: Attributes::default(),
        }
    }
}

impl FilterConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML, unknown value types
    /// or invalid selectors, and [`ConfigError::UnsupportedVersion`] for a
    /// schema newer than this build understands.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: FilterConfig = toml::from_str(content)?;
        config.migrate()
    }

    /// Serializes the configuration to pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Brings an older schema up to [`CONFIG_VERSION`].
    fn migrate(mut self) -> ConfigResult<Self> {
        if self.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: CONFIG_VERSION,
            });
        }
        // Version 1 is the first schema; nothing to migrate yet.
        self.version = CONFIG_VERSION;
        Ok(self)
    }
}

/// Role selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Filter-control roots.
    pub filter: Selector,
    /// List roots.
    pub list: Selector,
    /// Elements declaring one filter key (inside a filter root).
    pub key: Selector,
    /// Single-choice selector (inside a key element).
    pub select: Selector,
    /// Multi-choice master toggle (inside a key element).
    pub enabled: Selector,
    /// Multi-choice OR/AND toggle (inside a key element).
    pub relation: Selector,
    /// Multi-choice value toggles (inside a key element).
    pub values: Selector,
    /// Heading nodes (structural children of a list root).
    pub heading: Selector,
    /// List blocks (structural children of a list root).
    pub block: Selector,
    /// Items (inside a list block).
    pub item: Selector,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            filter: builtin(".list-filter"),
            list: builtin(".list-filter-target"),
            key: builtin("[data-filter-key]"),
            select: builtin("select"),
            enabled: builtin("input.filter-enabled"),
            relation: builtin("input.filter-relation"),
            values: builtin("input.filter-value"),
            heading: builtin("h1,h2,h3,h4,h5,h6"),
            block: builtin("ul,ol"),
            item: builtin("li"),
        }
    }
}

fn builtin(source: &str) -> Selector {
    Selector::parse(source).unwrap_or_else(|e| panic!("built-in selector '{source}': {e}"))
}

/// Base templates, expanded per key at bind time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Templates {
    /// URL variable name; `%key%` is replaced by the filter key.
    pub url_var: String,
    /// Item tag; `%key%` is replaced at bind time, `%value%` per value.
    pub tag: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            url_var: "%key%".to_string(),
            tag: "%key%-%value%".to_string(),
        }
    }
}

/// Structural attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    /// Shared identifier pairing a filter root with its list root.
    pub instance: String,
    /// Filter key on a key element.
    pub key: String,
    /// Per-key URL variable override on a key element.
    pub url_var: String,
    /// Per-key tag pattern override on a key element.
    pub tag_pattern: String,
    /// Visible item count written on blocks and headings.
    pub count: String,
    /// Heading depth.
    pub depth: String,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            instance: "data-filter-id".to_string(),
            key: "data-filter-key".to_string(),
            url_var: "data-url-var".to_string(),
            tag_pattern: "data-tag-pattern".to_string(),
            count: "data-count".to_string(),
            depth: "data-depth".to_string(),
        }
    }
}
