//! Query-string encoding of a criterion set.
//!
//! Grammar:
//!
//! ```text
//! query := pair ('&' pair)*
//! pair  := url_var '=' ['.'] value (',' value)*
//! ```
//!
//! A leading `.` selects [`Combine::And`]; without it the values combine with
//! [`Combine::Or`]. Names and values use standard form encoding, except that
//! the value separator `,` stays literal.

use std::collections::BTreeMap;

use listfilter_page::PageUrl;
use tracing::debug;

use crate::criteria::{Combine, Criterion};

/// Prefix marking an AND-combined value list.
pub const AND_MARKER: char = '.';

/// Separator between values.
pub const VALUE_SEPARATOR: char = ',';

/// Encodes one criterion's value list, before form encoding.
pub fn encode_value(criterion: &Criterion) -> String {
    let joined = criterion.values.join(&VALUE_SEPARATOR.to_string());
    match criterion.combine {
        Combine::And => format!("{AND_MARKER}{joined}"),
        Combine::Or => joined,
    }
}

/// Decodes one (already form-decoded) value list.
///
/// Values are trimmed; empty values are dropped.
pub fn decode_value(raw: &str) -> Criterion {
    let (combine, rest) = match raw.strip_prefix(AND_MARKER) {
        Some(rest) => (Combine::And, rest),
        None => (Combine::Or, raw),
    };
    let values = rest
        .split(VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty());
    Criterion::new(combine, values)
}

/// Encodes `(url_var, criterion)` pairs as a query string (without `?`).
///
/// Criteria with no values are omitted. An empty result means "no query".
pub fn encode_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a Criterion)>,
{
    let mut encoded = Vec::new();
    for (var, criterion) in pairs {
        if criterion.is_empty() {
            continue;
        }
        let value = encode_value(criterion);
        match serde_urlencoded::to_string(&[(var, value.as_str())][..]) {
            Ok(pair) => encoded.push(pair.replace("%2C", ",")),
            Err(e) => debug!(url_var = var, error = %e, "skipping unencodable query pair"),
        }
    }
    encoded.join("&")
}

/// Splits a query string (with or without a leading `?`) into form-decoded
/// `(url_var, raw_value)` pairs.
///
/// Malformed pairs and pairs with an empty name are skipped. When a variable
/// repeats, the first one wins.
pub fn query_pairs(query: &str) -> BTreeMap<String, String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut pairs = BTreeMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let parsed: Vec<(String, String)> = match serde_urlencoded::from_str(pair) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(pair, error = %e, "ignoring malformed query pair");
                continue;
            }
        };
        if let Some((var, raw)) = parsed.into_iter().next() {
            if var.is_empty() {
                continue;
            }
            pairs.entry(var).or_insert(raw);
        }
    }
    pairs
}

/// Decodes a query string into url variables and their criteria.
pub fn decode_query(query: &str) -> BTreeMap<String, Criterion> {
    query_pairs(query)
        .into_iter()
        .map(|(var, raw)| (var, decode_value(&raw)))
        .collect()
}

/// Returns `url` with its query replaced by `query`; path and fragment are kept.
///
/// An empty `query` removes the query string entirely.
pub fn rewrite_url(url: &PageUrl, query: &str) -> PageUrl {
    url.with_query(query)
}
