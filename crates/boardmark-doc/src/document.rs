//! Arena-backed document tree.

use std::fmt::Write as _;

use crate::{
    Dom, Element, Error, NodeId, Result,
    node::{NodeData, NodeKind},
};

/// A mutable tree of elements and text leaves.
///
/// The root is always an element at [`Document::root`]. Nodes are allocated
/// in an arena and addressed by [`NodeId`]; removing a node from the tree
/// detaches it without freeing the slot, so stale ids stay valid but become
/// unreachable.
#[derive(Clone, Debug)]
pub struct Document {
    /// Arena of all nodes ever created.
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new("body")
    }
}

impl Document {
    /// Create a document whose root element has the given tag.
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Element(Element::new(root_tag)))],
        }
    }

    /// The root element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of arena slots, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a document has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Payload of `node`, if it exists.
    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|n| &n.kind)
    }

    /// Element payload of `node`, if it is an element.
    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node)? {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    /// Mutable element payload, or an error naming why it is unavailable.
    pub fn element_mut(&mut self, node: NodeId) -> Result<&mut Element> {
        let slot = self.nodes.get_mut(node.0).ok_or(Error::UnknownNode(node))?;
        match &mut slot.kind {
            NodeKind::Element(e) => Ok(e),
            NodeKind::Text(_) => Err(Error::NotElement(node)),
        }
    }

    /// Children of `node` in document order; empty for unknown ids.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// All nodes below `node` in document (pre-)order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Nearest inclusive ancestor element of `node` satisfying `pred`.
    pub fn closest<F>(&self, node: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if let Some(el) = self.element(n)
                && pred(el)
            {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    /// Nearest inclusive ancestor carrying `class`.
    pub fn closest_with_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        self.closest(node, |e| e.has_class(class))
    }

    /// Append `class` to an element's class list if absent.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<()> {
        let el = self.element_mut(node)?;
        if !el.has_class(class) {
            el.classes.push(class.to_string());
        }
        Ok(())
    }

    /// Remove `node` from its parent. No-op for the root or detached nodes.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.retain(|c| *c != node);
        }
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.parent = None;
        }
    }

    /// Insert `new` directly after `reference` among its siblings.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) -> Result<()> {
        let parent = self
            .parent(reference)
            .ok_or_else(|| Error::Hierarchy(format!("{reference} has no parent")))?;
        self.check_insertable(parent, new)?;
        self.detach(new);
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings
            .iter()
            .position(|c| *c == reference)
            .map_or(siblings.len(), |i| i + 1);
        siblings.insert(pos, new);
        self.nodes[new.0].parent = Some(parent);
        Ok(())
    }

    /// Concatenated text of every text leaf under (and including) `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text(t)) = self.kind(node) {
            out.push_str(t);
        }
        for n in self.descendants(node) {
            if let Some(NodeKind::Text(t)) = self.kind(n) {
                out.push_str(t);
            }
        }
        out
    }

    /// Render an indented, human-readable outline of the subtree at `node`.
    pub fn outline(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.outline_into(node, 0, &mut out);
        out
    }

    /// Recursive worker for [`Document::outline`].
    fn outline_into(&self, node: NodeId, depth: usize, out: &mut String) {
        let pad = "  ".repeat(depth);
        match self.kind(node) {
            Some(NodeKind::Text(t)) => {
                let _ignored = writeln!(out, "{pad}{t:?}");
            }
            Some(NodeKind::Element(e)) => {
                let mut head = format!("<{}", e.tag);
                if !e.classes.is_empty() {
                    let _ignored = write!(head, " class=\"{}\"", e.classes.join(" "));
                }
                for (k, v) in &e.attrs {
                    let _ignored = write!(head, " {k}=\"{v}\"");
                }
                for (k, v) in &e.data {
                    let _ignored = write!(head, " data-{k}=\"{v}\"");
                }
                if !e.style.is_empty() {
                    let style: Vec<String> =
                        e.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    let _ignored = write!(head, " style=\"{}\"", style.join("; "));
                }
                head.push('>');
                let _ignored = writeln!(out, "{pad}{head}");
                for c in self.children(node) {
                    self.outline_into(*c, depth + 1, out);
                }
            }
            None => {}
        }
    }

    /// Validate that `child` may be placed under `parent`.
    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.nodes.get(child.0).is_none() {
            return Err(Error::UnknownNode(child));
        }
        if self.element(parent).is_none() {
            return match self.kind(parent) {
                Some(_) => Err(Error::NotElement(parent)),
                None => Err(Error::UnknownNode(parent)),
            };
        }
        let mut cur = Some(parent);
        while let Some(n) = cur {
            if n == child {
                return Err(Error::Hierarchy(format!(
                    "{child} would become its own ancestor"
                )));
            }
            cur = self.parent(n);
        }
        Ok(())
    }

    /// Allocate a detached slot.
    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData::new(kind));
        NodeId(self.nodes.len() - 1)
    }
}

impl Dom for Document {
    fn root(&self) -> NodeId {
        Self::root(self)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            if cur == self.root() {
                return true;
            }
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    fn data(&self, node: NodeId, key: &str) -> Option<&str> {
        self.element(node)?.data.get(key).map(String::as_str)
    }

    fn set_data(&mut self, node: NodeId, key: &str, value: &str) -> Result<()> {
        self.element_mut(node)?
            .data
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn style(&self, node: NodeId, prop: &str) -> Option<&str> {
        self.element(node)?.style.get(prop).map(String::as_str)
    }

    fn set_style(&mut self, node: NodeId, prop: &str, value: Option<&str>) -> Result<()> {
        let el = self.element_mut(node)?;
        match value {
            Some(v) => {
                el.style.insert(prop.to_string(), v.to_string());
            }
            None => {
                el.style.remove(prop);
            }
        }
        Ok(())
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(node)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        let slot = self.nodes.get_mut(node.0).ok_or(Error::UnknownNode(node))?;
        match &mut slot.kind {
            NodeKind::Text(t) => {
                *t = text.to_string();
                Ok(())
            }
            NodeKind::Element(_) => Err(Error::NotText(node)),
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(Element::new(tag)))
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child)?;
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    fn replace_with(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let parent = self
            .parent(old)
            .ok_or_else(|| Error::Hierarchy(format!("{old} has no parent")))?;
        self.check_insertable(parent, new)?;
        self.detach(new);
        let siblings = &mut self.nodes[parent.0].children;
        let pos = siblings
            .iter()
            .position(|c| *c == old)
            .ok_or_else(|| Error::Hierarchy(format!("{old} missing from its parent")))?;
        siblings[pos] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendants_are_in_document_order() {
        let mut doc = Document::default();
        let a = doc.create_element("div");
        let a1 = doc.create_text("a1");
        let b = doc.create_element("div");
        let b1 = doc.create_text("b1");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(a, a1).unwrap();
        doc.append_child(doc.root(), b).unwrap();
        doc.append_child(b, b1).unwrap();
        assert_eq!(doc.descendants(doc.root()), vec![a, a1, b, b1]);
        assert_eq!(doc.text_content(doc.root()), "a1b1");
    }

    #[test]
    fn replace_with_detaches_old_node() {
        let mut doc = Document::default();
        let t = doc.create_text("old");
        doc.append_child(doc.root(), t).unwrap();
        let span = doc.create_element("span");
        doc.replace_with(t, span).unwrap();
        assert!(!doc.is_attached(t));
        assert!(doc.is_attached(span));
        assert_eq!(doc.children(doc.root()), &[span]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut doc = Document::default();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(doc.root(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        assert!(matches!(
            doc.append_child(inner, outer),
            Err(Error::Hierarchy(_))
        ));
    }

    #[test]
    fn insert_after_places_sibling() {
        let mut doc = Document::default();
        let first = doc.create_text("first");
        let last = doc.create_text("last");
        doc.append_child(doc.root(), first).unwrap();
        doc.append_child(doc.root(), last).unwrap();
        let mid = doc.create_element("img");
        doc.insert_after(first, mid).unwrap();
        assert_eq!(doc.children(doc.root()), &[first, mid, last]);
    }

    #[test]
    fn handled_mark_is_inherited() {
        let mut doc = Document::default();
        let wrap = doc.create_element("span");
        let link = doc.create_element("a");
        let text = doc.create_text("https://x.org");
        doc.append_child(doc.root(), wrap).unwrap();
        doc.append_child(wrap, link).unwrap();
        doc.append_child(link, text).unwrap();
        assert!(!doc.is_handled(text, "urlLinked"));
        doc.set_data(wrap, "urlLinked", "true").unwrap();
        assert!(doc.is_handled(text, "urlLinked"));
    }
}
