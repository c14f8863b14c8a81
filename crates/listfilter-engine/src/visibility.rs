//! Item visibility and heading count aggregation.
//!
//! A list root's structural children interleave headings and list blocks.
//! Each recompute runs two passes:
//!
//! 1. every item's visibility is set from the matcher and each block stores
//!    its visible count;
//! 2. a single left-to-right scan keeps a stack of open headings. A heading
//!    of depth `d` pops every open heading of depth `>= d` (an equal depth is a
//!    sibling, not a child) and is pushed with a count of zero; a block adds
//!    its count to every heading on the stack.
//!
//! A heading is visible iff its aggregated count is non-zero.

use listfilter_page::{Document, NodeId};
use serde::Serialize;
use tracing::debug;

use crate::config::{Attributes, Selectors};
use crate::matcher::Matcher;

/// One structural child of a list root, reduced to what aggregation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// A heading at the given depth.
    Heading {
        /// Nesting depth; smaller is closer to the root.
        depth: u32,
    },
    /// A list block with this many visible items.
    Block {
        /// Visible item count.
        count: usize,
    },
}

/// Aggregates block counts into the headings that enclose them.
///
/// Returns one count per [`Segment::Heading`], in order.
pub fn aggregate_headings(segments: &[Segment]) -> Vec<usize> {
    let mut counts = Vec::new();
    let mut open: Vec<(u32, usize)> = Vec::new();

    for segment in segments {
        match *segment {
            Segment::Heading { depth } => {
                while open.last().is_some_and(|&(top, _)| top >= depth) {
                    open.pop();
                }
                open.push((depth, counts.len()));
                counts.push(0);
            }
            Segment::Block { count } => {
                for &(_, heading) in &open {
                    counts[heading] += count;
                }
            }
        }
    }

    counts
}

/// Aggregated state of one heading after a recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingStat {
    /// The heading element.
    pub node: NodeId,
    /// Nesting depth.
    pub depth: u32,
    /// Visible items below the heading (before the next heading of equal or lesser depth).
    pub count: usize,
    /// Whether the heading is shown.
    pub visible: bool,
    /// Heading text.
    pub title: String,
}

/// Result of applying a matcher to a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListStats {
    /// Items currently visible.
    pub visible_items: usize,
    /// Items in the list.
    pub total_items: usize,
    /// Visible count per block, in order.
    pub blocks: Vec<usize>,
    /// Per-heading aggregation, in order.
    pub headings: Vec<HeadingStat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Heading { node: NodeId, depth: u32 },
    Block { node: NodeId, items: Vec<NodeId> },
}

/// The structure of one list root, captured once at bind time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLayout {
    root: NodeId,
    entries: Vec<Entry>,
}

impl ListLayout {
    /// Captures headings, blocks and items below `root`.
    ///
    /// With `assign_depth`, each heading's depth is its `hN` rank and is written
    /// to the depth attribute; otherwise the existing attribute is read, falling
    /// back to the rank (or 0 for non-`hN` headings).
    pub fn build(
        doc: &mut Document,
        root: NodeId,
        selectors: &Selectors,
        attributes: &Attributes,
        assign_depth: bool,
    ) -> Self {
        let mut entries = Vec::new();
        let children = doc.children(root).to_vec();

        for child in children {
            let node = doc.node(child);
            if selectors.heading.matches(node) {
                let rank = heading_rank(node.tag());
                let depth = if assign_depth {
                    let depth = rank.unwrap_or(0);
                    doc.set_attr(child, &attributes.depth, depth.to_string());
                    depth
                } else {
                    node.attr(&attributes.depth)
                        .and_then(|d| d.trim().parse().ok())
                        .or(rank)
                        .unwrap_or(0)
                };
                entries.push(Entry::Heading { node: child, depth });
            } else if selectors.block.matches(node) {
                let items = doc.select_all(child, &selectors.item);
                entries.push(Entry::Block { node: child, items });
            }
        }

        debug!(
            root = root.index(),
            entries = entries.len(),
            "captured list layout"
        );
        Self { root, entries }
    }

    /// The list root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of items across all blocks.
    pub fn item_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match e {
                Entry::Block { items, .. } => items.len(),
                Entry::Heading { .. } => 0,
            })
            .sum()
    }

    /// Runs both passes: item visibility and block counts, then heading aggregation.
    ///
    /// Writes `hidden` on items and headings and the count attribute on blocks
    /// and headings.
    pub fn apply(&self, doc: &mut Document, matcher: &Matcher<'_>, count_attr: &str) -> ListStats {
        let mut stats = ListStats::default();
        let mut segments = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            match entry {
                Entry::Heading { depth, .. } => segments.push(Segment::Heading { depth: *depth }),
                Entry::Block { node, items } => {
                    let mut count = 0;
                    for &item in items {
                        let visible = matcher.is_match(doc.node(item));
                        doc.set_flag(item, "hidden", !visible);
                        count += usize::from(visible);
                    }
                    doc.set_attr(*node, count_attr, count.to_string());
                    stats.visible_items += count;
                    stats.total_items += items.len();
                    stats.blocks.push(count);
                    segments.push(Segment::Block { count });
                }
            }
        }

        let counts = aggregate_headings(&segments);
        let headings = self.entries.iter().filter_map(|e| match e {
            Entry::Heading { node, depth } => Some((*node, *depth)),
            Entry::Block { .. } => None,
        });
        for ((node, depth), count) in headings.zip(counts) {
            let visible = count != 0;
            doc.set_attr(node, count_attr, count.to_string());
            doc.set_flag(node, "hidden", !visible);
            stats.headings.push(HeadingStat {
                node,
                depth,
                count,
                visible,
                title: doc.text_content(node),
            });
        }

        stats
    }
}

/// Rank of an `h1`..`h6` tag.
pub fn heading_rank(tag: &str) -> Option<u32> {
    let digit = tag.strip_prefix(['h', 'H'])?;
    match digit.parse::<u32>() {
        Ok(rank @ 1..=6) => Some(rank),
        _ => None,
    }
}
