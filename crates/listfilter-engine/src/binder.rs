//! Control binding: from filter controls to criteria and back.
//!
//! Each filter key is bound to either a single-choice selector or a
//! multi-choice toggle group (master "enabled" toggle, optional OR/AND
//! relation toggle, one toggle per value). The binder reads the controls
//! into a [`CriteriaSet`], writes decoded URL state back into them, and
//! performs user interactions including the master-toggle coupling:
//!
//! - turning the master toggle on with no value selected selects every value;
//! - turning it off with every value selected deselects every value;
//! - toggling a value sets the master toggle to "at least one value selected".

use std::collections::BTreeMap;

use listfilter_page::{Document, NodeId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FilterConfig;
use crate::criteria::{Combine, CriteriaSet, Criterion};
use crate::template::{render, TagPattern};
use crate::url::decode_value;

/// Attribute holding a control's value.
const VALUE_ATTR: &str = "value";

/// Boolean attribute of a checked toggle.
const CHECKED: &str = "checked";

/// Boolean attribute of a selected option.
const SELECTED: &str = "selected";

/// Shape of a key's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    /// One selector; at most one value.
    SingleChoice,
    /// Master toggle, optional relation toggle and value toggles.
    MultiChoice,
}

/// Handles to the controls bound to one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controls {
    /// A selector and its options.
    Single {
        /// The selector element.
        select: NodeId,
        /// Its options in order.
        options: Vec<NodeId>,
    },
    /// A toggle group.
    Multi {
        /// Master toggle.
        enabled: NodeId,
        /// OR/AND toggle; checked means AND.
        relation: Option<NodeId>,
        /// Value toggles in order.
        values: Vec<NodeId>,
    },
}

/// One filter key's binding, fixed at bind time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The filter key.
    pub key: String,
    /// Query-string variable the key is encoded under.
    pub url_var: String,
    /// Tag template with a `%value%` placeholder.
    pub tag_pattern: TagPattern,
    /// Bound controls.
    pub controls: Controls,
}

impl Binding {
    /// Binds the controls inside one key element.
    ///
    /// Returns `None` if the element has no key attribute or contains no
    /// recognised control; such a key contributes no constraint.
    pub fn discover(doc: &Document, key_element: NodeId, config: &FilterConfig) -> Option<Self> {
        let attrs = &config.attributes;
        let selectors = &config.selectors;
        let key = doc.attr(key_element, &attrs.key)?.trim().to_string();
        if key.is_empty() {
            return None;
        }

        let controls = if let Some(select) = doc.select_first(key_element, &selectors.select) {
            let options = doc
                .children(select)
                .iter()
                .copied()
                .filter(|&o| doc.node(o).tag() == "option")
                .collect();
            Controls::Single { select, options }
        } else if let Some(enabled) = doc.select_first(key_element, &selectors.enabled) {
            Controls::Multi {
                enabled,
                relation: doc.select_first(key_element, &selectors.relation),
                values: doc.select_all(key_element, &selectors.values),
            }
        } else {
            debug!(key = %key, "filter key has no bound control");
            return None;
        };

        let url_var = match doc.attr(key_element, &attrs.url_var) {
            Some(var) if !var.is_empty() => var.to_string(),
            _ => render(&config.templates.url_var, &[("key", key.as_str())]),
        };
        let tag_pattern = match doc.attr(key_element, &attrs.tag_pattern) {
            Some(pattern) if !pattern.is_empty() => TagPattern::new(pattern),
            _ => TagPattern::for_key(&config.templates.tag, &key),
        };

        Some(Self {
            key,
            url_var,
            tag_pattern,
            controls,
        })
    }

    /// The control shape.
    pub fn kind(&self) -> ControlKind {
        match self.controls {
            Controls::Single { .. } => ControlKind::SingleChoice,
            Controls::Multi { .. } => ControlKind::MultiChoice,
        }
    }

    /// Reads the key's current criterion.
    ///
    /// Single-choice: present iff a non-empty option is selected; with no
    /// option flagged the first one counts as selected, as in a browser. Multi-choice:
    /// present iff the master toggle is checked, even with no value selected.
    pub fn read(&self, doc: &Document) -> Option<Criterion> {
        match &self.controls {
            Controls::Single { options, .. } => options
                .iter()
                .find(|&&o| doc.flag(o, SELECTED))
                .or_else(|| options.first())
                .map(|&o| value_of(doc, o))
                .filter(|v| !v.is_empty())
                .map(|v| Criterion::any([v])),
            Controls::Multi {
                enabled,
                relation,
                values,
            } => {
                if !doc.flag(*enabled, CHECKED) {
                    return None;
                }
                let combine = match relation {
                    Some(r) if doc.flag(*r, CHECKED) => Combine::And,
                    _ => Combine::Or,
                };
                let selected = values
                    .iter()
                    .filter(|&&v| doc.flag(v, CHECKED))
                    .map(|&v| value_of(doc, v));
                Some(Criterion::new(combine, selected))
            }
        }
    }

    /// Writes a criterion into the controls without any coupling.
    ///
    /// Single-choice selects the option for the first value (or nothing if no
    /// option has it). Multi-choice checks the master toggle, sets the relation
    /// toggle from the combination mode when present, and checks exactly the
    /// listed values.
    pub fn apply_criterion(&self, doc: &mut Document, criterion: &Criterion) {
        match &self.controls {
            Controls::Single { options, .. } => {
                select_option(doc, options, criterion.values.first().map(String::as_str));
            }
            Controls::Multi {
                enabled,
                relation,
                values,
            } => {
                doc.set_flag(*enabled, CHECKED, true);
                if let Some(r) = relation {
                    doc.set_flag(*r, CHECKED, criterion.combine == Combine::And);
                }
                for &v in values {
                    let on = criterion.values.iter().any(|c| *c == value_of(doc, v));
                    doc.set_flag(v, CHECKED, on);
                }
            }
        }
    }

    /// Resets the controls to "no constraint".
    pub fn clear(&self, doc: &mut Document) {
        match &self.controls {
            Controls::Single { options, .. } => select_option(doc, options, None),
            Controls::Multi {
                enabled,
                relation,
                values,
            } => {
                doc.set_flag(*enabled, CHECKED, false);
                if let Some(r) = relation {
                    doc.set_flag(*r, CHECKED, false);
                }
                for &v in values {
                    doc.set_flag(v, CHECKED, false);
                }
            }
        }
    }

    fn value_node(&self, doc: &Document, value: &str) -> Option<NodeId> {
        let nodes = match &self.controls {
            Controls::Single { options, .. } => options,
            Controls::Multi { values, .. } => values,
        };
        nodes.iter().copied().find(|&n| value_of(doc, n) == value)
    }
}

fn value_of(doc: &Document, node: NodeId) -> String {
    doc.attr(node, VALUE_ATTR).unwrap_or_default().to_string()
}

/// Selects the option carrying `value`; `None` (or an unknown value) selects
/// the empty option if there is one and clears every other option.
fn select_option(doc: &mut Document, options: &[NodeId], value: Option<&str>) {
    let wanted = value.unwrap_or_default();
    let target = options
        .iter()
        .copied()
        .find(|&o| value_of(doc, o) == wanted)
        .or_else(|| options.iter().copied().find(|&o| value_of(doc, o).is_empty()));
    for &o in options {
        doc.set_flag(o, SELECTED, Some(o) == target);
    }
}

/// A user interaction addressed by filter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Choose an option of a single-choice key; `None` chooses "no selection".
    Select {
        /// Filter key.
        key: String,
        /// Option value.
        value: Option<String>,
    },
    /// Flip a multi-choice master toggle.
    ToggleEnabled {
        /// Filter key.
        key: String,
    },
    /// Flip a multi-choice OR/AND toggle.
    ToggleRelation {
        /// Filter key.
        key: String,
    },
    /// Flip one value toggle of a multi-choice key.
    ToggleValue {
        /// Filter key.
        key: String,
        /// Value of the toggle.
        value: String,
    },
}

impl Interaction {
    /// The filter key the interaction targets.
    pub fn key(&self) -> &str {
        match self {
            Interaction::Select { key, .. }
            | Interaction::ToggleEnabled { key }
            | Interaction::ToggleRelation { key }
            | Interaction::ToggleValue { key, .. } => key,
        }
    }
}

/// The reaction a control node was registered with at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// An option of a single-choice selector was chosen.
    ChooseOption,
    /// The master toggle was clicked.
    ToggleEnabled,
    /// The relation toggle was clicked.
    ToggleRelation,
    /// A value toggle was clicked.
    ToggleValue,
}

/// All bindings of one filter instance plus their registered reactions.
#[derive(Debug, Clone, Default)]
pub struct ControlBinder {
    bindings: Vec<Binding>,
    reactions: BTreeMap<NodeId, (usize, Reaction)>,
}

impl ControlBinder {
    /// Binds every key element below `filter_root`.
    ///
    /// Keys without controls are skipped; a repeated key keeps its first binding.
    pub fn bind(doc: &Document, filter_root: NodeId, config: &FilterConfig) -> Self {
        let mut binder = Self::default();
        for key_element in doc.select_all(filter_root, &config.selectors.key) {
            let Some(binding) = Binding::discover(doc, key_element, config) else {
                continue;
            };
            if binder.binding(&binding.key).is_some() {
                warn!(key = %binding.key, "duplicate filter key ignored");
                continue;
            }
            binder.register(binding);
        }
        binder
    }

    fn register(&mut self, binding: Binding) {
        let index = self.bindings.len();
        match &binding.controls {
            Controls::Single { options, .. } => {
                for &o in options {
                    self.reactions.insert(o, (index, Reaction::ChooseOption));
                }
            }
            Controls::Multi {
                enabled,
                relation,
                values,
            } => {
                self.reactions.insert(*enabled, (index, Reaction::ToggleEnabled));
                if let Some(r) = relation {
                    self.reactions.insert(*r, (index, Reaction::ToggleRelation));
                }
                for &v in values {
                    self.reactions.insert(v, (index, Reaction::ToggleValue));
                }
            }
        }
        self.bindings.push(binding);
    }

    /// Bindings in discovery order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// The binding for a key.
    pub fn binding(&self, key: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.key == key)
    }

    /// The tag pattern for a key.
    pub fn pattern_for(&self, key: &str) -> Option<&TagPattern> {
        self.binding(key).map(|b| &b.tag_pattern)
    }

    /// The key and reaction registered for a control node.
    pub fn reaction(&self, node: NodeId) -> Option<(&str, Reaction)> {
        self.reactions
            .get(&node)
            .map(|&(index, reaction)| (self.bindings[index].key.as_str(), reaction))
    }

    /// Reads every binding into a criterion set (keys without a constraint are absent).
    pub fn snapshot(&self, doc: &Document) -> CriteriaSet {
        self.bindings
            .iter()
            .filter_map(|b| b.read(doc).map(|c| (b.key.as_str(), c)))
            .collect()
    }

    /// Decodes one url variable's raw value and writes it into the bound controls.
    ///
    /// Returns false if no binding uses `url_var`. Never triggers a recompute.
    pub fn apply_from_url_var(&self, doc: &mut Document, url_var: &str, raw: &str) -> bool {
        match self.bindings.iter().find(|b| b.url_var == url_var) {
            Some(binding) => {
                binding.apply_criterion(doc, &decode_value(raw));
                true
            }
            None => false,
        }
    }

    /// Resets every binding to "no constraint".
    pub fn clear_all(&self, doc: &mut Document) {
        for binding in &self.bindings {
            binding.clear(doc);
        }
    }

    /// Performs a key-addressed interaction, including toggle coupling.
    ///
    /// Returns false (and changes nothing) if the key or value has no
    /// matching control of the right kind.
    pub fn perform(&self, doc: &mut Document, interaction: &Interaction) -> bool {
        let Some(binding) = self.binding(interaction.key()) else {
            return false;
        };
        let node = match (interaction, &binding.controls) {
            (Interaction::Select { value, .. }, Controls::Single { options, .. }) => {
                select_option(doc, options, value.as_deref());
                return true;
            }
            (Interaction::ToggleEnabled { .. }, Controls::Multi { enabled, .. }) => *enabled,
            (Interaction::ToggleRelation { .. }, Controls::Multi { relation, .. }) => {
                match relation {
                    Some(r) => *r,
                    None => return false,
                }
            }
            (Interaction::ToggleValue { value, .. }, Controls::Multi { .. }) => {
                match binding.value_node(doc, value) {
                    Some(v) => v,
                    None => return false,
                }
            }
            _ => return false,
        };
        self.activate(doc, node)
    }

    /// Performs the reaction registered for a control node, as if it was clicked.
    ///
    /// Returns false if the node has no registered reaction.
    pub fn activate(&self, doc: &mut Document, node: NodeId) -> bool {
        let Some(&(index, reaction)) = self.reactions.get(&node) else {
            return false;
        };
        let binding = &self.bindings[index];
        match (reaction, &binding.controls) {
            (Reaction::ChooseOption, Controls::Single { options, .. }) => {
                for &o in options {
                    doc.set_flag(o, SELECTED, o == node);
                }
            }
            (Reaction::ToggleEnabled, Controls::Multi { enabled, values, .. }) => {
                let on = !doc.flag(*enabled, CHECKED);
                doc.set_flag(*enabled, CHECKED, on);
                let selected = values.iter().filter(|&&v| doc.flag(v, CHECKED)).count();
                if on && selected == 0 {
                    set_all(doc, values, true);
                } else if !on && selected == values.len() {
                    set_all(doc, values, false);
                }
            }
            (Reaction::ToggleRelation, Controls::Multi { .. }) => {
                let on = !doc.flag(node, CHECKED);
                doc.set_flag(node, CHECKED, on);
            }
            (Reaction::ToggleValue, Controls::Multi { enabled, values, .. }) => {
                let on = !doc.flag(node, CHECKED);
                doc.set_flag(node, CHECKED, on);
                let any = values.iter().any(|&v| doc.flag(v, CHECKED));
                doc.set_flag(*enabled, CHECKED, any);
            }
            _ => return false,
        }
        true
    }
}

fn set_all(doc: &mut Document, nodes: &[NodeId], on: bool) {
    for &n in nodes {
        doc.set_flag(n, CHECKED, on);
    }
}

#[cfg(test)]
#[path = "binder_tests.rs"]
mod tests;
