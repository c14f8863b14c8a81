//! Compound selector matching for element roles.
//!
//! Only the subset needed to pick filter controls and list structure out of a
//! page is supported: an optional tag name followed by any number of `.class`,
//! `#id`, `[attr]` and `[attr=value]` parts. Alternatives are separated by
//! commas. Combinators (descendant, child, sibling) are not supported.
//!
//! # Example
//!
//! ```
//! use listfilter_page::Selector;
//!
//! let selector: Selector = "input.filter-value[type=checkbox], option".parse().unwrap();
//! assert_eq!(selector.alternatives(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::Node;
use crate::error::SelectorError;

/// A parsed selector list.
///
/// Keeps its source text so it can be displayed and serialized unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector {
    source: String,
    compounds: Vec<Compound>,
}

/// One comma-separated alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

impl Selector {
    /// Parses a selector list.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if the input is empty or contains syntax
    /// outside the supported subset.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut parts = Vec::new();
        let mut start = 0;
        for (at, c) in top_level(source) {
            if c == ',' {
                parts.push(&source[start..at]);
                start = at + 1;
            }
        }
        parts.push(&source[start..]);

        let compounds = parts
            .into_iter()
            .map(|part| parse_compound(source, part.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: source.to_string(),
            compounds,
        })
    }

    /// Returns true if the node matches any alternative.
    pub fn matches(&self, node: &Node) -> bool {
        self.compounds.iter().any(|c| c.matches(node))
    }

    /// Number of comma-separated alternatives.
    pub fn alternatives(&self) -> usize {
        self.compounds.len()
    }

    /// The selector text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Compound {
    fn matches(&self, node: &Node) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|test| match (&test.value, node.attr(&test.name)) {
            (None, found) => found.is_some(),
            (Some(expected), Some(found)) => expected == found,
            (Some(_), None) => false,
        })
    }
}

fn parse_compound(source: &str, part: &str) -> Result<Compound, SelectorError> {
    if part.is_empty() {
        return Err(SelectorError::invalid(source, "empty alternative"));
    }
    if top_level(part).any(|(_, c)| c.is_whitespace() || matches!(c, '>' | '+' | '~')) {
        return Err(SelectorError::invalid(source, "combinators are not supported"));
    }

    let mut compound = Compound::default();
    let mut rest = part;

    let tag_len = rest.find(['.', '#', '[']).unwrap_or(rest.len());
    if tag_len > 0 {
        let tag = &rest[..tag_len];
        if tag != "*" {
            if !is_ident(tag) {
                return Err(SelectorError::invalid(source, format!("bad tag name '{tag}'")));
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_len..];
    }

    while let Some(first) = rest.chars().next() {
        match first {
            '.' | '#' => {
                let body = &rest[1..];
                let len = body.find(['.', '#', '[']).unwrap_or(body.len());
                let name = &body[..len];
                if !is_ident(name) {
                    return Err(SelectorError::invalid(source, format!("bad name after '{first}'")));
                }
                if first == '.' {
                    compound.classes.push(name.to_string());
                } else {
                    compound.attrs.push(AttrTest {
                        name: "id".to_string(),
                        value: Some(name.to_string()),
                    });
                }
                rest = &body[len..];
            }
            '[' => {
                let close = bracket_close(rest)
                    .ok_or_else(|| SelectorError::invalid(source, "unclosed '['"))?;
                compound.attrs.push(parse_attr(source, &rest[1..close])?);
                rest = &rest[close + 1..];
            }
            other => {
                return Err(SelectorError::invalid(source, format!("unexpected '{other}'")));
            }
        }
    }

    Ok(compound)
}

fn parse_attr(source: &str, body: &str) -> Result<AttrTest, SelectorError> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (body.trim(), None),
    };
    if !is_ident(name) {
        return Err(SelectorError::invalid(source, format!("bad attribute name '{name}'")));
    }
    Ok(AttrTest {
        name: name.to_string(),
        value,
    })
}

/// Characters outside `[...]`, with their byte offsets. Quoted attribute
/// values may hold `]`, `,` and whitespace.
fn top_level(s: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut in_bracket = false;
    let mut quote: Option<char> = None;
    s.char_indices().filter(move |&(_, c)| {
        if !in_bracket {
            in_bracket = c == '[';
            return true;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ']' => in_bracket = false,
            None => {}
        }
        false
    })
}

/// Byte offset of the `]` closing the bracket `s` starts with.
fn bracket_close(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (at, c) in s.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ']' => return Some(at),
            None => {}
        }
    }
    None
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.source
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Markup};

    fn node(tag: &str, class: &str, attrs: &[(&str, &str)]) -> Document {
        let mut markup = Markup::new(tag).with_class(class);
        for (k, v) in attrs {
            markup = markup.with_attr(*k, *v);
        }
        Document::from_markup(markup)
    }

    fn matches(selector: &str, doc: &Document) -> bool {
        Selector::parse(selector)
            .unwrap()
            .matches(doc.node(doc.root()))
    }

    #[test]
    fn test_tag_selector_is_case_insensitive() {
        let doc = node("H2", "", &[]);
        assert!(matches("h2", &doc));
        assert!(!matches("h3", &doc));
    }

    #[test]
    fn test_class_selector_requires_every_class() {
        let doc = node("input", "filter-value primary", &[]);
        assert!(matches(".filter-value", &doc));
        assert!(matches("input.filter-value.primary", &doc));
        assert!(!matches(".filter-value.secondary", &doc));
    }

    #[test]
    fn test_attribute_presence_and_value() {
        let doc = node("div", "", &[("data-filter-key", "color")]);
        assert!(matches("[data-filter-key]", &doc));
        assert!(matches("[data-filter-key=color]", &doc));
        assert!(matches("[data-filter-key=\"color\"]", &doc));
        assert!(!matches("[data-filter-key=size]", &doc));
        assert!(!matches("[data-url-var]", &doc));
    }

    #[test]
    fn test_id_selector_matches_id_attribute() {
        let doc = node("ul", "", &[("id", "results")]);
        assert!(matches("#results", &doc));
        assert!(matches("ul#results", &doc));
        assert!(!matches("#other", &doc));
    }

    #[test]
    fn test_alternatives() {
        let doc = node("h4", "", &[]);
        assert!(matches("h1,h2,h3,h4,h5,h6", &doc));
        assert!(matches("ul, h4", &doc));
        assert_eq!(Selector::parse("h1, h2").unwrap().alternatives(), 2);
    }

    #[test]
    fn test_universal_selector() {
        let doc = node("span", "x", &[]);
        assert!(matches("*", &doc));
        assert!(matches("*.x", &doc));
    }

    #[test]
    fn test_rejects_empty_and_combinators() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("ul li"),
            Err(SelectorError::Invalid { .. })
        ));
        assert!(matches!(
            Selector::parse("ul > li"),
            Err(SelectorError::Invalid { .. })
        ));
        assert!(matches!(
            Selector::parse("a,"),
            Err(SelectorError::Invalid { .. })
        ));
        assert!(matches!(
            Selector::parse("[data-x"),
            Err(SelectorError::Invalid { .. })
        ));
    }

    #[test]
    fn test_quoted_values_may_hold_spaces_commas_and_brackets() {
        let doc = node("option", "", &[("title", "a b"), ("value", "a,b]")]);
        assert!(matches("[title=\"a b\"]", &doc));
        assert!(matches("option[value='a,b]']", &doc));

        let selector = Selector::parse("[value=\"a,b]\"], li").unwrap();
        assert_eq!(selector.alternatives(), 2);
        assert!(selector.matches(doc.node(doc.root())));
    }

    #[test]
    fn test_unclosed_quote_is_unclosed_bracket() {
        match Selector::parse("[title=\"a b]") {
            Err(SelectorError::Invalid { reason, .. }) => assert_eq!(reason, "unclosed '['"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_serde_keeps_source_text() {
        let selector: Selector = serde_json::from_str("\"input.filter-enabled\"").unwrap();
        assert_eq!(selector.as_str(), "input.filter-enabled");
        assert_eq!(
            serde_json::to_string(&selector).unwrap(),
            "\"input.filter-enabled\""
        );
        assert!(serde_json::from_str::<Selector>("\"a b\"").is_err());
    }
}
