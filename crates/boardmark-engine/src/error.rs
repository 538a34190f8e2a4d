use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the boardmark engine.
///
/// None of these ever abort a scan cycle: callers log and move on to the
/// next occurrence.
#[derive(Debug, Error)]
pub enum Error {
    /// A durable key-value read or write failed.
    #[error("storage error for key '{key}': {message}")]
    Storage {
        /// Storage key involved.
        key: String,
        /// Underlying failure.
        message: String,
    },

    /// A hook the host page is expected to provide is absent.
    #[error("missing host element: {0}")]
    MissingHostElement(String),

    /// The document rejected a mutation.
    #[error("document error: {0}")]
    Doc(#[from] boardmark_doc::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure while performing a filesystem operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with context.
    #[error("Engine error: {0}")]
    Msg(String),
}
