//! Filter-state engine for tagged lists.
//!
//! Synchronizes filter controls with item visibility in a list and mirrors
//! the filter state into the page URL's query string:
//!
//! - [`criteria`]: per-key OR/AND criteria and the full criterion set
//! - [`matcher`]: decides whether an item's tags satisfy the criteria
//! - [`url`]: compact query-string encoding of the criteria
//! - [`visibility`]: item visibility and heading count aggregation
//! - [`binder`]: control bindings, interactions and toggle coupling
//! - [`instance`]: the per-instance lifecycle and recompute cycle
//! - [`discovery`]: pairing filter roots with list roots on a page
//!
//! # Example
//!
//! ```
//! use listfilter_engine::{bind_all, FilterConfig};
//! use listfilter_page::Page;
//!
//! let json = r#"{"tag": "body", "children": [
//!     {"tag": "form", "class": "list-filter", "children": [
//!         {"tag": "div", "attrs": {"data-filter-key": "size"}, "children": [
//!             {"tag": "input", "class": "filter-enabled"},
//!             {"tag": "input", "class": "filter-value", "attrs": {"value": "S"}},
//!             {"tag": "input", "class": "filter-value", "attrs": {"value": "M"}}
//!         ]}
//!     ]},
//!     {"tag": "div", "class": "list-filter-target", "children": [
//!         {"tag": "ul", "children": [
//!             {"tag": "li", "class": "size-S"},
//!             {"tag": "li", "class": "size-M"}
//!         ]}
//!     ]}
//! ]}"#;
//! let mut page = Page::from_json(json, "/list?size=M")?;
//!
//! let instances = bind_all(&mut page, &FilterConfig::default());
//! let instance = instances[0].as_ref().unwrap();
//! assert_eq!(instance.snapshot(&page).len(), 1);
//! assert_eq!(page.location().to_string(), "/list?size=M");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binder;
pub mod config;
pub mod criteria;
pub mod discovery;
pub mod error;
pub mod instance;
pub mod matcher;
pub mod template;
pub mod url;
pub mod visibility;

pub use binder::{Binding, ControlBinder, ControlKind, Controls, Interaction, Reaction};
pub use config::{Attributes, FilterConfig, Selectors, Templates, CONFIG_VERSION};
pub use criteria::{Combine, CriteriaSet, Criterion};
pub use discovery::{bind_all, discover};
pub use error::{BindingError, ConfigError, ConfigResult, Result};
pub use instance::{CycleReport, FilterInstance, Phase};
pub use matcher::{is_match_one, Matcher, Tagged};
pub use template::{render, TagPattern};
pub use visibility::{aggregate_headings, HeadingStat, ListLayout, ListStats, Segment};
