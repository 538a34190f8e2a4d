use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Index of a node within a [`crate::Document`] arena.
///
/// Ids are never reused; a detached node keeps its id but is no longer
/// reachable from the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element: tag name plus the attribute families the scanners care about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name (`div`, `span`, `a`, ...).
    pub tag: String,
    /// Class list in insertion order.
    pub classes: Vec<String>,
    /// Plain attributes (`href`, `src`, ...).
    pub attrs: BTreeMap<String, String>,
    /// `data-*` attributes keyed by their dataset name (`imageInlined`).
    pub data: BTreeMap<String, String>,
    /// Inline style properties (`color`, `max-width`, ...).
    pub style: BTreeMap<String, String>,
}

impl Element {
    /// Create an element with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// True if `class` is present in the class list.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Payload of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with children.
    Element(Element),
    /// A text leaf.
    Text(String),
}

/// Arena slot.
#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    /// Node payload.
    pub(crate) kind: NodeKind,
    /// Parent link; `None` for the root and detached nodes.
    pub(crate) parent: Option<NodeId>,
    /// Children in document order.
    pub(crate) children: Vec<NodeId>,
}

impl NodeData {
    /// Fresh, detached slot.
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}
