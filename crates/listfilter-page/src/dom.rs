//! Element arena for a headless page.
//!
//! A [`Document`] is built once from a [`Markup`] tree and then addressed by
//! [`NodeId`] handles. Structure never changes after construction; only
//! attributes are mutated (boolean state such as `checked`, `selected` and
//! `hidden` is the presence of a same-named attribute, as in HTML).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::selector::Selector;

/// Handle to one element of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in document order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Serializable element tree used to load and dump documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markup {
    /// Element tag name.
    pub tag: String,

    /// Space-separated class list.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,

    /// Attributes (boolean attributes carry an empty value).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    /// Text content directly inside the element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child elements in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Markup>,
}

impl Markup {
    /// Creates an element with the given tag and nothing else.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets the class list.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Adds an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Adds a boolean attribute such as `checked`.
    pub fn with_flag(self, name: impl Into<String>) -> Self {
        self.with_attr(name, "")
    }

    /// Sets the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Appends a child element.
    pub fn with_child(mut self, child: Markup) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several child elements.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Markup>) -> Self {
        self.children.extend(children);
        self
    }
}

/// One element of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Lowercased tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Class names in declaration order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Returns true if the element carries the class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Returns true if the attribute is present.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Text directly inside the element.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Parent element, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child elements in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An element arena rooted at a single element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Builds a document from a markup tree.
    pub fn from_markup(markup: Markup) -> Self {
        let mut doc = Self { nodes: Vec::new() };
        doc.insert(markup, None);
        doc
    }

    /// Parses a document from its JSON markup.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Markup`](crate::PageError::Markup) if the JSON is
    /// malformed or does not describe an element tree.
    pub fn from_json(json: &str) -> Result<Self> {
        let markup: Markup = serde_json::from_str(json)?;
        Ok(Self::from_markup(markup))
    }

    fn insert(&mut self, markup: Markup, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: markup.tag.to_ascii_lowercase(),
            classes: markup.class.split_whitespace().map(str::to_string).collect(),
            attrs: markup.attrs,
            text: markup.text,
            parent,
            children: Vec::new(),
        });
        for child in markup.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// The root element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the document has no elements (never the case once built).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not produced by this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the node for a handle, or `None` if it is out of range.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Child elements of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// All descendants of `scope` in document order, excluding `scope`.
    ///
    /// Nodes are inserted depth-first, so a subtree occupies a contiguous
    /// index range right after its root.
    pub fn descendants(&self, scope: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let end = self.subtree_end(scope);
        (scope.0 + 1..end).map(NodeId)
    }

    fn subtree_end(&self, scope: NodeId) -> usize {
        let mut current = scope;
        while let Some(&last) = self.nodes[current.0].children.last() {
            current = last;
        }
        current.0 + 1
    }

    /// Descendants of `scope` matching the selector, in document order.
    pub fn select_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|&id| selector.matches(self.node(id)))
            .collect()
    }

    /// First descendant of `scope` matching the selector.
    pub fn select_first(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .find(|&id| selector.matches(self.node(id)))
    }

    /// Returns an attribute value.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attr(name)
    }

    /// Sets an attribute value.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        self.nodes[id.0].attrs.insert(name.to_string(), value.into());
    }

    /// Removes an attribute.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        self.nodes[id.0].attrs.remove(name);
    }

    /// Returns true if a boolean attribute is present.
    pub fn flag(&self, id: NodeId, name: &str) -> bool {
        self.nodes[id.0].has_attr(name)
    }

    /// Sets or clears a boolean attribute.
    pub fn set_flag(&mut self, id: NodeId, name: &str, on: bool) {
        if on {
            self.set_attr(id, name, "");
        } else {
            self.remove_attr(id, name);
        }
    }

    /// Concatenated text of a node and its descendants, whitespace-normalized.
    pub fn text_content(&self, id: NodeId) -> String {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|n| self.nodes[n.0].text.as_deref())
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Rebuilds the markup tree below (and including) a node.
    pub fn to_markup(&self, id: NodeId) -> Markup {
        let node = &self.nodes[id.0];
        Markup {
            tag: node.tag.clone(),
            class: node.classes.join(" "),
            attrs: node.attrs.clone(),
            text: node.text.clone(),
            children: node.children.iter().map(|&c| self.to_markup(c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_markup(
            Markup::new("body").with_children([
                Markup::new("div")
                    .with_class("list-filter")
                    .with_child(Markup::new("select").with_children([
                        Markup::new("option").with_attr("value", ""),
                        Markup::new("option").with_attr("value", "red").with_flag("selected"),
                    ])),
                Markup::new("ul").with_class("items").with_children([
                    Markup::new("li").with_class("color-red").with_text("  Apple "),
                    Markup::new("li")
                        .with_class("color-blue")
                        .with_text("Sky")
                        .with_child(Markup::new("em").with_text("blue")),
                ]),
            ]),
        )
    }

    #[test]
    fn test_ids_follow_document_order() {
        let doc = sample();
        let tags: Vec<&str> = std::iter::once(doc.root())
            .chain(doc.descendants(doc.root()))
            .map(|id| doc.node(id).tag())
            .collect();
        assert_eq!(
            tags,
            ["body", "div", "select", "option", "option", "ul", "li", "li", "em"]
        );
    }

    #[test]
    fn test_descendants_stay_inside_subtree() {
        let doc = sample();
        let div = doc.children(doc.root())[0];
        let inside: Vec<&str> = doc.descendants(div).map(|id| doc.node(id).tag()).collect();
        assert_eq!(inside, ["select", "option", "option"]);

        let li = doc.children(doc.children(doc.root())[1])[0];
        assert_eq!(doc.descendants(li).count(), 0);
    }

    #[test]
    fn test_select_all_and_first() {
        let doc = sample();
        let option = Selector::parse("option").unwrap();
        let selected = Selector::parse("option[selected]").unwrap();
        assert_eq!(doc.select_all(doc.root(), &option).len(), 2);
        let found = doc.select_first(doc.root(), &selected).unwrap();
        assert_eq!(doc.attr(found, "value"), Some("red"));
    }

    #[test]
    fn test_flags_are_attribute_presence() {
        let mut doc = sample();
        let li = doc.select_first(doc.root(), &Selector::parse("li").unwrap()).unwrap();
        assert!(!doc.flag(li, "hidden"));
        doc.set_flag(li, "hidden", true);
        assert!(doc.flag(li, "hidden"));
        assert_eq!(doc.attr(li, "hidden"), Some(""));
        doc.set_flag(li, "hidden", false);
        assert!(!doc.flag(li, "hidden"));
    }

    #[test]
    fn test_text_content_normalizes_whitespace() {
        let doc = sample();
        let items = doc.select_all(doc.root(), &Selector::parse("li").unwrap());
        assert_eq!(doc.text_content(items[0]), "Apple");
        assert_eq!(doc.text_content(items[1]), "Sky blue");
    }

    #[test]
    fn test_json_markup_round_trip() {
        let json = r#"{
            "tag": "UL",
            "class": "items  primary",
            "children": [{"tag": "li", "class": "size-S", "attrs": {"data-id": "1"}, "text": "Shirt"}]
        }"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.node(doc.root()).tag(), "ul");
        assert_eq!(doc.node(doc.root()).classes(), ["items", "primary"]);

        let markup = doc.to_markup(doc.root());
        assert_eq!(markup.class, "items primary");
        assert_eq!(markup.children[0].attrs.get("data-id").map(String::as_str), Some("1"));
        assert_eq!(Document::from_markup(markup), doc);
    }

    #[test]
    fn test_from_json_rejects_non_element() {
        assert!(Document::from_json("[1, 2]").is_err());
        assert!(Document::from_json("{\"class\": \"x\"}").is_err());
    }
}
