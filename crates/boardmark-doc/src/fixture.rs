//! JSON fixtures describing a document tree.
//!
//! A fixture is a nested value where strings are text leaves and objects are
//! elements:
//!
//! ```json
//! {"tag": "body", "children": [
//!   {"tag": "div", "classes": ["mchat__messages"], "children": [
//!     {"tag": "t", "children": ["!t!w+90"]}
//!   ]}
//! ]}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Document, Dom, NodeId, Result, node::NodeKind};

/// Serializable description of a subtree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocSpec {
    /// A text leaf.
    Text(String),
    /// An element and its children.
    Element {
        /// Tag name.
        tag: String,
        /// Class list.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        classes: Vec<String>,
        /// Plain attributes.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: BTreeMap<String, String>,
        /// `data-*` attributes.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        data: BTreeMap<String, String>,
        /// Inline styles.
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        style: BTreeMap<String, String>,
        /// Children in document order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<DocSpec>,
    },
}

/// Build a document from a spec. A text spec yields a `body` root holding it.
pub fn from_spec(spec: &DocSpec) -> Result<Document> {
    match spec {
        DocSpec::Text(_) => {
            let mut doc = Document::default();
            let root = doc.root();
            build(&mut doc, root, spec)?;
            Ok(doc)
        }
        DocSpec::Element { tag, children, .. } => {
            let mut doc = Document::new(tag);
            let root = doc.root();
            apply_attributes(&mut doc, root, spec)?;
            for c in children {
                build(&mut doc, root, c)?;
            }
            Ok(doc)
        }
    }
}

/// Parse a JSON fixture into a document.
pub fn from_json(json: &str) -> Result<Document> {
    let spec: DocSpec = serde_json::from_str(json)?;
    from_spec(&spec)
}

/// Capture the subtree at `node` as a spec.
pub fn to_spec(doc: &Document, node: NodeId) -> Option<DocSpec> {
    match doc.kind(node)? {
        NodeKind::Text(t) => Some(DocSpec::Text(t.clone())),
        NodeKind::Element(e) => Some(DocSpec::Element {
            tag: e.tag.clone(),
            classes: e.classes.clone(),
            attrs: e.attrs.clone(),
            data: e.data.clone(),
            style: e.style.clone(),
            children: doc
                .children(node)
                .iter()
                .filter_map(|c| to_spec(doc, *c))
                .collect(),
        }),
    }
}

/// Create `spec` under `parent`.
fn build(doc: &mut Document, parent: NodeId, spec: &DocSpec) -> Result<()> {
    match spec {
        DocSpec::Text(t) => {
            let n = doc.create_text(t);
            doc.append_child(parent, n)
        }
        DocSpec::Element { tag, children, .. } => {
            let n = doc.create_element(tag);
            doc.append_child(parent, n)?;
            apply_attributes(doc, n, spec)?;
            for c in children {
                build(doc, n, c)?;
            }
            Ok(())
        }
    }
}

/// Copy classes, attributes, data and style from `spec` onto `node`.
fn apply_attributes(doc: &mut Document, node: NodeId, spec: &DocSpec) -> Result<()> {
    if let DocSpec::Element {
        classes,
        attrs,
        data,
        style,
        ..
    } = spec
    {
        let el = doc.element_mut(node)?;
        el.classes.extend(classes.iter().cloned());
        el.attrs.extend(attrs.clone());
        el.data.extend(data.clone());
        el.style.extend(style.clone());
    }
    Ok(())
}
