use std::result::Result as StdResult;

use thiserror::Error;

use crate::NodeId;

/// Convenient result type for document operations.
pub type Result<T> = StdResult<T, Error>;

/// Errors raised by document mutation and fixture loading.
#[derive(Debug, Error)]
pub enum Error {
    /// The node id does not refer to a node in this document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// A text operation was attempted on an element.
    #[error("node {0} is not a text node")]
    NotText(NodeId),

    /// An element operation was attempted on a text node.
    #[error("node {0} is not an element")]
    NotElement(NodeId),

    /// The requested insertion would make a node its own ancestor, or the
    /// reference node has no parent to insert relative to.
    #[error("invalid hierarchy: {0}")]
    Hierarchy(String),

    /// A document fixture could not be decoded.
    #[error("fixture decode error: {0}")]
    Fixture(#[from] serde_json::Error),
}
