//! Headless page model for list filters.
//!
//! A [`Page`] owns a [`Document`] (an element arena addressed by [`NodeId`])
//! and the tab's [`SessionHistory`]. Filter instances read and mutate both
//! through `&mut Page`; nothing here knows about filters.
//!
//! # Example
//!
//! ```
//! use listfilter_page::{Page, Selector};
//!
//! let page = Page::from_json(
//!     r#"{"tag": "ul", "children": [{"tag": "li", "class": "color-red"}]}"#,
//!     "/shop?color=red#top",
//! )?;
//! let items = page.document.select_all(page.document.root(), &Selector::parse("li")?);
//! assert_eq!(items.len(), 1);
//! assert_eq!(page.location().query, "color=red");
//! # Ok::<(), listfilter_page::PageError>(())
//! ```

pub mod dom;
pub mod error;
pub mod location;
pub mod selector;

pub use dom::{Document, Markup, Node, NodeId};
pub use error::{PageError, Result, SelectorError};
pub use location::{PageUrl, SessionHistory};
pub use selector::Selector;

/// A loaded page: its document and the session history of its tab.
#[derive(Debug, Clone)]
pub struct Page {
    /// The element tree.
    pub document: Document,
    /// Session history; the current entry is the page URL.
    pub history: SessionHistory,
}

impl Page {
    /// Creates a page from a document and its initial URL.
    pub fn new(document: Document, url: &str) -> Self {
        Self {
            document,
            history: SessionHistory::new(PageUrl::parse(url)),
        }
    }

    /// Parses the JSON markup and creates a page at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Markup`] if the markup is not a valid element tree.
    pub fn from_json(json: &str, url: &str) -> Result<Self> {
        Ok(Self::new(Document::from_json(json)?, url))
    }

    /// The URL of the current history entry.
    pub fn location(&self) -> &PageUrl {
        self.history.location()
    }
}
