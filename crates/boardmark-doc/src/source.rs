//! Text snapshots and logical identities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Document, Dom, NodeId, node::NodeKind};

/// Where to scan and how to scope identities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    /// Subtree to scan.
    pub root: NodeId,
    /// Class of the container that numbers messages for identity purposes.
    pub container_class: String,
}

/// Stable logical identity of a text occurrence: trimmed content plus the
/// index of its parent among the container's element descendants.
///
/// This is a best-effort heuristic. Two identical messages at different
/// positions get different identities; a message that moves (because earlier
/// messages were removed) gets a new one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Build an identity from trimmed content and a structural index.
    /// An index of `-1` means the parent is the container itself.
    pub fn new(content: &str, index: i64) -> Self {
        Self(format!("{}:{}", content.trim(), index))
    }

    /// String form, as persisted.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A text leaf observed during one snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextOccurrence {
    /// The text node.
    pub node: NodeId,
    /// Its parent element at snapshot time.
    pub parent: Option<NodeId>,
    /// Text value at snapshot time.
    pub text: String,
    /// Logical identity; `None` when the text is outside any container.
    pub identity: Option<Identity>,
}

/// Produces a fresh list of text occurrences on every call.
pub trait TextSource {
    /// Every text leaf under `scope.root` whose value satisfies `pred`, in
    /// document order, each exactly once.
    fn snapshot(&self, scope: &Scope, pred: &dyn Fn(&str) -> bool) -> Vec<TextOccurrence>;
}

/// `data-*` key carried by every element the dispatchers create. Such
/// elements are invisible to identity numbering, so inlining an image or a
/// link never renumbers the host's own messages.
pub const GENERATED_MARK: &str = "bmGenerated";

/// True if `node` is an element the host created (not one of ours).
fn is_host_element(doc: &Document, node: NodeId) -> bool {
    doc.element(node)
        .is_some_and(|e| !e.data.contains_key(GENERATED_MARK))
}

/// Identity of the text node `node` relative to the nearest container
/// carrying `container_class`.
///
/// The structural position is that of the nearest host-created ancestor of
/// the text among the container's host-created element descendants.
pub fn identity_of(doc: &Document, node: NodeId, container_class: &str) -> Option<Identity> {
    let text = doc.text(node)?;
    let parent = doc.parent(node)?;
    let anchor = doc.closest(parent, |e| !e.data.contains_key(GENERATED_MARK))?;
    let container = doc.closest_with_class(anchor, container_class)?;
    let index = doc
        .descendants(container)
        .into_iter()
        .filter(|n| is_host_element(doc, *n))
        .position(|n| n == anchor)
        .map_or(-1, |i| i as i64);
    Some(Identity::new(text, index))
}

impl TextSource for Document {
    fn snapshot(&self, scope: &Scope, pred: &dyn Fn(&str) -> bool) -> Vec<TextOccurrence> {
        self.descendants(scope.root)
            .into_iter()
            .filter_map(|n| match self.kind(n) {
                Some(NodeKind::Text(t)) if pred(t) => Some(TextOccurrence {
                    node: n,
                    parent: self.parent(n),
                    text: t.clone(),
                    identity: identity_of(self, n, &scope.container_class),
                }),
                _ => None,
            })
            .collect()
    }
}
