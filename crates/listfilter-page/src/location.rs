//! Page URL and session history.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The part of a page URL the filters care about: path, query and fragment.
///
/// `query` and `fragment` are stored without their leading `?` / `#`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUrl {
    /// Path (may include scheme and host; kept verbatim).
    pub path: String,
    /// Query string without the leading `?`.
    pub query: String,
    /// Fragment without the leading `#`.
    pub fragment: String,
}

impl PageUrl {
    /// Splits a URL into path, query and fragment.
    ///
    /// Never fails: anything before `?`/`#` is taken as the path.
    pub fn parse(url: &str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, fragment),
            None => (url, ""),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, query),
            None => (rest, ""),
        };
        Self {
            path: path.to_string(),
            query: query.to_string(),
            fragment: fragment.to_string(),
        }
    }

    /// Returns a copy with the query replaced and path and fragment kept.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self {
            path: self.path.clone(),
            query: query.into(),
            fragment: self.fragment.clone(),
        }
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

/// Ordered history entries with a cursor, like a browser tab's session history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistory {
    entries: Vec<PageUrl>,
    current: usize,
}

impl SessionHistory {
    /// Starts a history with a single entry.
    pub fn new(url: PageUrl) -> Self {
        Self {
            entries: vec![url],
            current: 0,
        }
    }

    /// The URL of the current entry.
    pub fn location(&self) -> &PageUrl {
        &self.entries[self.current]
    }

    /// Navigates: drops any forward entries and appends a new one.
    pub fn push_state(&mut self, url: PageUrl) {
        self.entries.truncate(self.current + 1);
        self.entries.push(url);
        self.current += 1;
    }

    /// Rewrites the current entry in place.
    pub fn replace_state(&mut self, url: PageUrl) {
        self.entries[self.current] = url;
    }

    /// Moves one entry back. Returns false if already at the first entry.
    pub fn back(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Moves one entry forward. Returns false if already at the last entry.
    pub fn forward(&mut self) -> bool {
        if self.current + 1 >= self.entries.len() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a history holds at least one entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
