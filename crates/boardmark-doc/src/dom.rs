//! Read and write capabilities the scanners need from a host document.

use crate::{NodeId, Result, TextSource};

/// Write model over a host document, plus the handful of reads that
/// dispatchers need after a [`TextSource`] snapshot has been taken.
///
/// [`crate::Document`] is the in-memory implementation; anything else that
/// can expose the same operations (a browser bridge, a recording fake) can
/// stand in for it.
pub trait Dom: TextSource + Send {
    /// Root element scans start from by default.
    fn root(&self) -> NodeId;

    /// Parent of `node`, or `None` for the root and detached nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Current value of a text node; `None` for elements and unknown ids.
    fn text(&self, node: NodeId) -> Option<&str>;

    /// True if `node` is still reachable from the root.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Read a `data-*` attribute.
    fn data(&self, node: NodeId, key: &str) -> Option<&str>;

    /// Write a `data-*` attribute.
    fn set_data(&mut self, node: NodeId, key: &str, value: &str) -> Result<()>;

    /// Read an inline style property.
    fn style(&self, node: NodeId, prop: &str) -> Option<&str>;

    /// Set (`Some`) or clear (`None`) an inline style property.
    fn set_style(&mut self, node: NodeId, prop: &str, value: Option<&str>) -> Result<()>;

    /// Set a plain attribute.
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    /// Replace the value of a text node in place.
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()>;

    /// Allocate a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Allocate a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Append `child` as the last child of `parent`, moving it if attached.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Put `new` in the tree position currently held by `old`.
    fn replace_with(&mut self, old: NodeId, new: NodeId) -> Result<()>;

    /// True if `node` or any ancestor carries the `data-*` mark `key`.
    fn is_handled(&self, node: NodeId, key: &str) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if self.data(n, key).is_some() {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }
}
