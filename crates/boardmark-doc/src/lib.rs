//! In-memory document model for boardmark.
//!
//! The scanners never talk to a browser directly. They read text through
//! [`TextSource`] snapshots and mutate through the [`Dom`] write model, both
//! implemented here by the arena-backed [`Document`]:
//! - [`Document`]: elements, text leaves, data marks, inline styles
//! - [`TextSource`] / [`TextOccurrence`] / [`Identity`]: fresh per-scan views
//! - [`fixture`]: JSON descriptions of trees for tests and the CLI

mod document;
mod dom;
mod error;
pub mod fixture;
mod node;
mod source;

pub use document::Document;
pub use dom::Dom;
pub use error::{Error, Result};
pub use fixture::DocSpec;
pub use node::{Element, NodeId, NodeKind};
pub use source::{GENERATED_MARK, Identity, Scope, TextOccurrence, TextSource, identity_of};
