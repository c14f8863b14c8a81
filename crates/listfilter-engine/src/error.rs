//! Error types for the filter engine.

use thiserror::Error;

/// Result type for binding a filter instance.
pub type Result<T> = std::result::Result<T, BindingError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Fatal errors raised while binding a filter instance to its page roots.
///
/// Binding is not retried; other instances on the same page are unaffected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingError {
    /// No filter-control root carries the instance identifier.
    #[error("no filter root found for instance '{id}'")]
    MissingFilterRoot {
        /// The instance identifier that was looked up.
        id: String,
    },

    /// No list root carries the instance identifier.
    #[error("no list root found for instance '{id}'")]
    MissingListRoot {
        /// The instance identifier that was looked up.
        id: String,
    },
}

impl BindingError {
    /// Creates a missing filter root error.
    pub fn missing_filter_root(id: impl Into<String>) -> Self {
        BindingError::MissingFilterRoot { id: id.into() }
    }

    /// Creates a missing list root error.
    pub fn missing_list_root(id: impl Into<String>) -> Self {
        BindingError::MissingListRoot { id: id.into() }
    }

    /// The instance identifier the error refers to.
    pub fn instance_id(&self) -> &str {
        match self {
            BindingError::MissingFilterRoot { id } | BindingError::MissingListRoot { id } => id,
        }
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML is malformed or a value is invalid (including selectors).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The config schema is newer than this build supports.
    #[error("unsupported config version {found} (this build supports up to {supported})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Highest supported version.
        supported: u32,
    },
}
