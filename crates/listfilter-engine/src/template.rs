//! `%name%` template substitution for URL variables and tag names.

use serde::Serialize;

/// Replaces every `%name%` placeholder with its bound value.
///
/// Placeholders without a binding are left as-is.
///
/// # Example
///
/// ```
/// use listfilter_engine::template::render;
///
/// assert_eq!(render("%key%-%value%", &[("key", "size")]), "size-%value%");
/// ```
pub fn render(template: &str, bindings: &[(&str, &str)]) -> String {
    bindings
        .iter()
        .fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("%{name}%"), value)
        })
}

/// A per-key tag template with a `%value%` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagPattern(String);

impl TagPattern {
    /// Expands a base template for one key.
    pub fn for_key(base: &str, key: &str) -> Self {
        Self(render(base, &[("key", key)]))
    }

    /// Uses a per-key pattern as given.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    /// Derives the tag an item must carry to match `value`.
    ///
    /// With `normalize_underscores`, `_` becomes `-` after substitution.
    pub fn tag_for(&self, value: &str, normalize_underscores: bool) -> String {
        let tag = render(&self.0, &[("value", value)]);
        if normalize_underscores {
            tag.replace('_', "-")
        } else {
            tag
        }
    }

    /// The pattern text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
