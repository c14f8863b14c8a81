//! Criterion model: what each filter key currently constrains.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// How the selected values of one key combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combine {
    /// The item must carry at least one selected value's tag.
    #[default]
    Or,
    /// The item must carry every selected value's tag.
    And,
}

impl fmt::Display for Combine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combine::Or => f.write_str("OR"),
            Combine::And => f.write_str("AND"),
        }
    }
}

/// One key's active constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Combination mode.
    pub combine: Combine,
    /// Selected values in control order.
    pub values: Vec<String>,
}

impl Criterion {
    /// Creates an OR criterion.
    pub fn any<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Combine::Or, values)
    }

    /// Creates an AND criterion.
    pub fn all<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Combine::And, values)
    }

    /// Creates a criterion with the given combination mode.
    pub fn new<I, S>(combine: Combine, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            combine,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if no value is selected; such a criterion constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The full criterion set: one entry per key currently contributing a constraint.
///
/// Entries keep the order of the bindings that produced them, so encoding is
/// stable across cycles. Keys that are absent impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaSet {
    entries: Vec<(String, Criterion)>,
}

impl CriteriaSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the criterion for a key. Replacing keeps the key's position.
    pub fn insert(&mut self, key: impl Into<String>, criterion: Criterion) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = criterion,
            None => self.entries.push((key, criterion)),
        }
    }

    /// Returns the criterion for a key.
    pub fn get(&self, key: &str) -> Option<&Criterion> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c)
    }

    /// Returns true if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Number of present keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Criterion)> for CriteriaSet {
    fn from_iter<T: IntoIterator<Item = (K, Criterion)>>(iter: T) -> Self {
        let mut set = CriteriaSet::new();
        for (key, criterion) in iter {
            set.insert(key, criterion);
        }
        set
    }
}

impl Serialize for CriteriaSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
