//! Pairing of filter roots with list roots.

use std::collections::BTreeSet;

use listfilter_page::Page;
use tracing::{debug, warn};

use crate::config::FilterConfig;
use crate::error::Result;
use crate::instance::FilterInstance;

/// Prefix of generated instance identifiers.
const GENERATED_ID_PREFIX: &str = "list-filter-";

/// Pairs the n-th filter root with the n-th list root (document order) and
/// tags both with a shared identifier.
///
/// A root that already carries an identifier keeps it, and its partner
/// adopts it. When both roots of a pair carry different identifiers, both are
/// returned, so each reports its missing partner when bound. Surplus roots on either side still get an identifier, so
/// binding them reports the missing partner. Returns the identifiers in
/// pairing order, without repeats.
pub fn discover(page: &mut Page, config: &FilterConfig) -> Vec<String> {
    let doc = &mut page.document;
    let attr = &config.attributes.instance;
    let filters = doc.select_all(doc.root(), &config.selectors.filter);
    let lists = doc.select_all(doc.root(), &config.selectors.list);

    let mut taken: BTreeSet<String> = filters
        .iter()
        .chain(&lists)
        .filter_map(|&n| doc.attr(n, attr))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    let mut next = 1;
    let mut ids = Vec::new();

    for index in 0..filters.len().max(lists.len()) {
        let pair: Vec<_> = [filters.get(index), lists.get(index)]
            .into_iter()
            .flatten()
            .copied()
            .collect();
        let mut existing: Vec<String> = Vec::new();
        for &node in &pair {
            if let Some(id) = doc.attr(node, attr).filter(|id| !id.is_empty()) {
                if !existing.iter().any(|e| e == id) {
                    existing.push(id.to_string());
                }
            }
        }
        if existing.is_empty() {
            let id = loop {
                let candidate = format!("{GENERATED_ID_PREFIX}{next}");
                next += 1;
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            taken.insert(id.clone());
            existing.push(id);
        }

        for &node in &pair {
            if doc.attr(node, attr).map_or(true, str::is_empty) {
                doc.set_attr(node, attr, existing[0].as_str());
            }
        }

        if existing.len() > 1 {
            warn!(ids = ?existing, "paired roots carry different identifiers");
        }
        for id in existing {
            if ids.contains(&id) {
                warn!(id = %id, "instance identifier used by more than one pair");
                continue;
            }
            ids.push(id);
        }
    }

    debug!(
        filters = filters.len(),
        lists = lists.len(),
        instances = ids.len(),
        "discovered filter instances"
    );
    ids
}

/// Discovers and binds every filter instance on the page.
///
/// Every instance is seeded from the URL as it was before the first one
/// rewrote it. Returns one result per identifier; a failed binding affects
/// only that instance.
pub fn bind_all(page: &mut Page, config: &FilterConfig) -> Vec<Result<FilterInstance>> {
    let query = page.location().query.clone();
    discover(page, config)
        .into_iter()
        .map(|id| {
            let result = FilterInstance::bind_with_query(page, id, config, &query);
            if let Err(e) = &result {
                warn!(error = %e, "filter instance not bound");
            }
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindingError;
    use listfilter_page::{Document, Markup};

    fn filter_root() -> Markup {
        Markup::new("form").with_class("list-filter")
    }

    fn list_root() -> Markup {
        Markup::new("div").with_class("list-filter-target")
    }

    fn page(children: impl IntoIterator<Item = Markup>) -> Page {
        Page::new(
            Document::from_markup(Markup::new("body").with_children(children)),
            "/",
        )
    }

    fn ids_on(page: &Page, class: &str) -> Vec<Option<String>> {
        let doc = &page.document;
        let selector = listfilter_page::Selector::parse(class).unwrap();
        doc.select_all(doc.root(), &selector)
            .into_iter()
            .map(|n| doc.attr(n, "data-filter-id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_discover_pairs_positionally() {
        let mut page = page([filter_root(), filter_root(), list_root(), list_root()]);
        let ids = discover(&mut page, &FilterConfig::default());

        assert_eq!(ids, ["list-filter-1", "list-filter-2"]);
        let expected = vec![
            Some("list-filter-1".to_string()),
            Some("list-filter-2".to_string()),
        ];
        assert_eq!(ids_on(&page, ".list-filter"), expected);
        assert_eq!(ids_on(&page, ".list-filter-target"), expected);
    }

    #[test]
    fn test_discover_keeps_existing_identifier() {
        let mut page = page([
            filter_root(),
            list_root().with_attr("data-filter-id", "catalog"),
            filter_root(),
            list_root(),
            filter_root().with_attr("data-filter-id", "list-filter-1"),
            list_root(),
        ]);
        let ids = discover(&mut page, &FilterConfig::default());

        // The generated id skips the one already present on the page.
        assert_eq!(ids, ["catalog", "list-filter-2", "list-filter-1"]);
        assert_eq!(
            ids_on(&page, ".list-filter"),
            vec![
                Some("catalog".to_string()),
                Some("list-filter-2".to_string()),
                Some("list-filter-1".to_string()),
            ]
        );
        assert_eq!(ids_on(&page, ".list-filter"), ids_on(&page, ".list-filter-target"));
    }

    #[test]
    fn test_discover_is_stable() {
        let mut page = page([filter_root(), list_root()]);
        let config = FilterConfig::default();
        let first = discover(&mut page, &config);
        let second = discover(&mut page, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_surplus_root_fails_alone() {
        let mut page = page([filter_root(), list_root(), filter_root()]);
        let results = bind_all(&mut page, &FilterConfig::default());

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().unwrap_err(),
            &BindingError::missing_list_root("list-filter-2")
        );
    }

    #[test]
    fn test_mismatched_identifiers_both_reported() {
        let mut page = page([
            filter_root().with_attr("data-filter-id", "a"),
            list_root().with_attr("data-filter-id", "b"),
        ]);
        let config = FilterConfig::default();
        assert_eq!(discover(&mut page, &config), ["a", "b"]);

        let results = bind_all(&mut page, &config);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].as_ref().unwrap_err(),
            &BindingError::missing_list_root("a")
        );
        assert_eq!(
            results[1].as_ref().unwrap_err(),
            &BindingError::missing_filter_root("b")
        );
    }

    #[test]
    fn test_no_roots() {
        let mut page = page([Markup::new("p")]);
        assert!(bind_all(&mut page, &FilterConfig::default()).is_empty());
    }
}
