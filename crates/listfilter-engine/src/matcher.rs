//! Match evaluation of list items against a criterion set.
//!
//! Keys combine with an implicit AND; inside one key, [`Combine::Or`] needs
//! at least one derived tag and [`Combine::And`] needs all of them.
//!
//! # Example
//!
//! ```
//! use listfilter_engine::criteria::{CriteriaSet, Criterion};
//! use listfilter_engine::matcher::Matcher;
//! use listfilter_engine::template::TagPattern;
//!
//! let pattern = TagPattern::for_key("%key%-%value%", "size");
//! let criteria: CriteriaSet = [("size", Criterion::all(["S", "M"]))].into_iter().collect();
//! let matcher = Matcher::new(&criteria, |_| Some(&pattern), true);
//!
//! assert!(matcher.is_match(&["size-S", "size-M"][..]));
//! assert!(!matcher.is_match(&["size-S"][..]));
//! ```

use std::collections::{BTreeSet, HashSet};

use listfilter_page::Node;

use crate::criteria::{Combine, CriteriaSet, Criterion};
use crate::template::TagPattern;

/// Anything that carries tags.
pub trait Tagged {
    /// Returns true if the tag is present.
    fn has_tag(&self, tag: &str) -> bool;
}

impl Tagged for Node {
    fn has_tag(&self, tag: &str) -> bool {
        self.has_class(tag)
    }
}

impl<S: AsRef<str>> Tagged for [S] {
    fn has_tag(&self, tag: &str) -> bool {
        self.iter().any(|t| t.as_ref() == tag)
    }
}

impl<S: AsRef<str>> Tagged for Vec<S> {
    fn has_tag(&self, tag: &str) -> bool {
        self.as_slice().has_tag(tag)
    }
}

impl Tagged for HashSet<String> {
    fn has_tag(&self, tag: &str) -> bool {
        self.contains(tag)
    }
}

impl Tagged for BTreeSet<String> {
    fn has_tag(&self, tag: &str) -> bool {
        self.contains(tag)
    }
}

/// Evaluates one criterion set against items.
#[derive(Debug)]
pub struct Matcher<'a> {
    rules: Vec<(&'a Criterion, &'a TagPattern)>,
    normalize_underscores: bool,
}

impl<'a> Matcher<'a> {
    /// Creates a matcher.
    ///
    /// # Arguments
    ///
    /// * `criteria` - The current criterion set
    /// * `pattern_for` - Resolves a key to its tag pattern; keys without one are skipped
    /// * `normalize_underscores` - Replace `_` with `-` in derived tags
    ///
    /// Keys with an empty value set are dropped: they constrain nothing.
    pub fn new<F>(criteria: &'a CriteriaSet, pattern_for: F, normalize_underscores: bool) -> Self
    where
        F: Fn(&str) -> Option<&'a TagPattern>,
    {
        let rules = criteria
            .iter()
            .filter(|(_, criterion)| !criterion.is_empty())
            .filter_map(|(key, criterion)| pattern_for(key).map(|pattern| (criterion, pattern)))
            .collect();
        Self {
            rules,
            normalize_underscores,
        }
    }

    /// Returns true if the item satisfies every key's criterion.
    pub fn is_match<T: Tagged + ?Sized>(&self, item: &T) -> bool {
        self.rules.iter().all(|(criterion, pattern)| {
            is_match_one(item, criterion, pattern, self.normalize_underscores)
        })
    }

    /// Returns true if no key constrains the items.
    pub fn is_unconstrained(&self) -> bool {
        self.rules.is_empty()
    }

    /// Filters a slice of items, returning only those that match.
    pub fn filter_items<'b, T: Tagged>(&self, items: &'b [T]) -> Vec<&'b T> {
        items.iter().filter(|item| self.is_match(*item)).collect()
    }
}

/// Checks one key's criterion against an item.
pub fn is_match_one<T: Tagged + ?Sized>(
    item: &T,
    criterion: &Criterion,
    pattern: &TagPattern,
    normalize_underscores: bool,
) -> bool {
    let mut tags = criterion
        .values
        .iter()
        .map(|value| pattern.tag_for(value, normalize_underscores));
    match criterion.combine {
        Combine::Or => tags.any(|tag| item.has_tag(&tag)),
        Combine::And => tags.all(|tag| item.has_tag(&tag)),
    }
}
