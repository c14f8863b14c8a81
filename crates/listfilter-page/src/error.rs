//! Error types for the page model.

use thiserror::Error;

/// Result type for page operations.
pub type Result<T> = std::result::Result<T, PageError>;

/// Errors that can occur while loading or querying a page.
#[derive(Debug, Error)]
pub enum PageError {
    /// The markup could not be parsed as JSON.
    #[error("invalid page markup: {0}")]
    Markup(#[from] serde_json::Error),

    /// A selector used to query the page is invalid.
    #[error("{0}")]
    Selector(#[from] SelectorError),
}

/// Errors produced while parsing a selector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector text is empty.
    #[error("selector is empty")]
    Empty,

    /// The selector uses syntax outside the supported subset.
    #[error("invalid selector '{selector}': {reason}")]
    Invalid {
        /// The full selector text.
        selector: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl SelectorError {
    /// Creates an invalid selector error.
    pub fn invalid(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        SelectorError::Invalid {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}
