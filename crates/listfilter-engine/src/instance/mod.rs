//! Filter instance lifecycle and the recompute cycle.
//!
//! A [`FilterInstance`] pairs one filter-control root with one list root.
//! Binding moves it through two phases:
//!
//! - `Initializing`: controls and list layout are captured, URL state is
//!   applied with recompute suspended, and exactly one recompute runs;
//! - `Ready`: every interaction that changes a control runs exactly one
//!   recompute (snapshot, match, aggregate, rewrite URL).
//!
//! The instance owns no page data. Every operation takes the [`Page`] it was
//! bound on, so several instances can share one page.
//!
//! # Example
//!
//! ```
//! use listfilter_engine::{FilterConfig, FilterInstance, Interaction};
//! use listfilter_page::{Document, Markup, Page};
//!
//! let doc = Document::from_markup(Markup::new("body").with_children([
//!     Markup::new("form")
//!         .with_class("list-filter")
//!         .with_attr("data-filter-id", "shop")
//!         .with_child(
//!             Markup::new("div").with_attr("data-filter-key", "color").with_child(
//!                 Markup::new("select").with_children([
//!                     Markup::new("option").with_attr("value", ""),
//!                     Markup::new("option").with_attr("value", "red"),
//!                 ]),
//!             ),
//!         ),
//!     Markup::new("div")
//!         .with_class("list-filter-target")
//!         .with_attr("data-filter-id", "shop")
//!         .with_child(Markup::new("ul").with_children([
//!             Markup::new("li").with_class("color-red"),
//!             Markup::new("li").with_class("color-blue"),
//!         ])),
//! ]));
//! let mut page = Page::new(doc, "/shop#top");
//!
//! let mut instance = FilterInstance::bind(&mut page, "shop", &FilterConfig::default())?;
//! let report = instance
//!     .dispatch(&mut page, &Interaction::Select { key: "color".into(), value: Some("red".into()) })
//!     .unwrap();
//!
//! assert_eq!(report.visible_items, 1);
//! assert_eq!(page.location().to_string(), "/shop?color=red#top");
//! # Ok::<(), listfilter_engine::BindingError>(())
//! ```

use std::fmt;

use listfilter_page::{Document, NodeId, Page, Selector};
use serde::Serialize;
use tracing::debug;

use crate::binder::{Binding, ControlBinder, Interaction};
use crate::config::FilterConfig;
use crate::criteria::CriteriaSet;
use crate::error::{BindingError, Result};
use crate::matcher::Matcher;
use crate::url::{encode_query, query_pairs, rewrite_url};
use crate::visibility::{HeadingStat, ListLayout};

/// Lifecycle phase of a filter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Binding and applying initial URL state.
    Initializing,
    /// Reacting to interactions.
    Ready,
}

/// Outcome of one recompute cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Instance identifier.
    pub instance: String,
    /// Criteria read from the controls.
    pub criteria: CriteriaSet,
    /// Encoded query string (empty when nothing constrains the list).
    pub query: String,
    /// The rewritten page URL.
    pub url: String,
    /// Items left visible.
    pub visible_items: usize,
    /// Items in the list.
    pub total_items: usize,
    /// Visible count per list block, in order.
    pub blocks: Vec<usize>,
    /// Per-heading counts and visibility, in order.
    pub headings: Vec<HeadingStat>,
}

type Observer = Box<dyn FnMut(&CycleReport)>;

/// One bound filter/list pair.
pub struct FilterInstance {
    id: String,
    filter_root: NodeId,
    list_root: NodeId,
    binder: ControlBinder,
    layout: ListLayout,
    phase: Phase,
    stop_update: bool,
    normalize_underscores: bool,
    count_attr: String,
    observers: Vec<Observer>,
}

impl fmt::Debug for FilterInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterInstance")
            .field("id", &self.id)
            .field("filter_root", &self.filter_root)
            .field("list_root", &self.list_root)
            .field("phase", &self.phase)
            .field("bindings", &self.binder.bindings().len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl FilterInstance {
    /// Binds the filter root and list root carrying `id` and runs the first cycle.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::MissingFilterRoot`] or
    /// [`BindingError::MissingListRoot`] if either root cannot be resolved.
    /// The page is left untouched in that case.
    pub fn bind(page: &mut Page, id: impl Into<String>, config: &FilterConfig) -> Result<Self> {
        let query = page.location().query.clone();
        Self::bind_with_query(page, id, config, &query)
    }

    /// Like [`bind`](Self::bind), but seeds control state from `query`
    /// instead of the current URL.
    pub(crate) fn bind_with_query(
        page: &mut Page,
        id: impl Into<String>,
        config: &FilterConfig,
        query: &str,
    ) -> Result<Self> {
        let id = id.into();
        let instance_attr = &config.attributes.instance;
        let filter_root = find_root(&page.document, &config.selectors.filter, instance_attr, &id)
            .ok_or_else(|| BindingError::missing_filter_root(&id))?;
        let list_root = find_root(&page.document, &config.selectors.list, instance_attr, &id)
            .ok_or_else(|| BindingError::missing_list_root(&id))?;

        let binder = ControlBinder::bind(&page.document, filter_root, config);
        let layout = ListLayout::build(
            &mut page.document,
            list_root,
            &config.selectors,
            &config.attributes,
            config.assign_heading_depth,
        );

        let mut instance = Self {
            id,
            filter_root,
            list_root,
            binder,
            layout,
            phase: Phase::Initializing,
            stop_update: false,
            normalize_underscores: config.normalize_underscores,
            count_attr: config.attributes.count.clone(),
            observers: Vec::new(),
        };

        if config.init_from_url {
            instance.with_updates_suspended(page, |this, page| this.apply_url_vars(page, query));
        }
        instance.recompute(page);
        instance.phase = Phase::Ready;

        debug!(
            instance = %instance.id,
            keys = instance.binder.bindings().len(),
            items = instance.layout.item_count(),
            "filter instance ready"
        );
        Ok(instance)
    }

    /// Instance identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The filter-control root element.
    pub fn filter_root(&self) -> NodeId {
        self.filter_root
    }

    /// The list root element.
    pub fn list_root(&self) -> NodeId {
        self.list_root
    }

    /// Key bindings in discovery order.
    pub fn bindings(&self) -> &[Binding] {
        self.binder.bindings()
    }

    /// The current criteria, read from the controls.
    pub fn snapshot(&self, page: &Page) -> CriteriaSet {
        self.binder.snapshot(&page.document)
    }

    /// Registers a callback invoked with the report of every recompute cycle.
    pub fn subscribe(&mut self, observer: impl FnMut(&CycleReport) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Runs one recompute cycle: snapshot, match, aggregate, rewrite URL.
    ///
    /// Returns `None` without touching the page while updates are suspended.
    pub fn recompute(&mut self, page: &mut Page) -> Option<CycleReport> {
        if self.stop_update {
            debug!(instance = %self.id, "recompute suspended");
            return None;
        }

        let binder = &self.binder;
        let criteria = binder.snapshot(&page.document);
        let matcher = Matcher::new(&criteria, |key| binder.pattern_for(key), self.normalize_underscores);
        let stats = self.layout.apply(&mut page.document, &matcher, &self.count_attr);

        let query = encode_query(criteria.iter().filter_map(|(key, criterion)| {
            binder.binding(key).map(|b| (b.url_var.as_str(), criterion))
        }));
        let url = rewrite_url(page.location(), &query);
        page.history.replace_state(url.clone());

        debug!(
            instance = %self.id,
            visible = stats.visible_items,
            total = stats.total_items,
            query = %query,
            "recomputed list visibility"
        );

        let report = CycleReport {
            instance: self.id.clone(),
            criteria,
            query,
            url: url.to_string(),
            visible_items: stats.visible_items,
            total_items: stats.total_items,
            blocks: stats.blocks,
            headings: stats.headings,
        };
        for observer in &mut self.observers {
            observer(&report);
        }
        Some(report)
    }

    /// Performs a key-addressed interaction and recomputes once.
    ///
    /// Returns `None` if the interaction matched no control; nothing changes then.
    pub fn dispatch(&mut self, page: &mut Page, interaction: &Interaction) -> Option<CycleReport> {
        if !self.binder.perform(&mut page.document, interaction) {
            debug!(instance = %self.id, key = interaction.key(), "interaction matched no control");
            return None;
        }
        self.recompute(page)
    }

    /// Performs the reaction registered for a control node and recomputes once.
    ///
    /// Nodes without a registered reaction are ignored.
    pub fn activate(&mut self, page: &mut Page, node: NodeId) -> Option<CycleReport> {
        if !self.binder.activate(&mut page.document, node) {
            return None;
        }
        self.recompute(page)
    }

    /// Applies every known url variable of `query` to the controls, then
    /// recomputes once.
    ///
    /// Keys the query does not mention keep their current state.
    pub fn apply_query(&mut self, page: &mut Page, query: &str) -> Option<CycleReport> {
        self.with_updates_suspended(page, |this, page| this.apply_url_vars(page, query));
        self.recompute(page)
    }

    /// Clears every control, then recomputes once.
    pub fn reset(&mut self, page: &mut Page) -> Option<CycleReport> {
        self.with_updates_suspended(page, |this, page| this.binder.clear_all(&mut page.document));
        self.recompute(page)
    }

    fn apply_url_vars(&mut self, page: &mut Page, query: &str) {
        for (var, raw) in query_pairs(query) {
            if !self.binder.apply_from_url_var(&mut page.document, &var, &raw) {
                debug!(instance = %self.id, url_var = %var, "ignoring unknown url variable");
            }
        }
    }

    /// Runs `f` with recompute suspended, restoring the previous guard state.
    fn with_updates_suspended<R>(
        &mut self,
        page: &mut Page,
        f: impl FnOnce(&mut Self, &mut Page) -> R,
    ) -> R {
        let previous = std::mem::replace(&mut self.stop_update, true);
        let result = f(self, page);
        self.stop_update = previous;
        result
    }
}

/// The first element matching `selector` whose instance attribute equals `id`.
fn find_root(doc: &Document, selector: &Selector, attr: &str, id: &str) -> Option<NodeId> {
    doc.select_all(doc.root(), selector)
        .into_iter()
        .find(|&node| doc.attr(node, attr) == Some(id))
}
