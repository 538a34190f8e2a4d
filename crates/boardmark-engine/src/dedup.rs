//! Set of logical identities that have already been dispatched.
//!
//! The set is written through to durable storage on every mutation and
//! reloaded at startup. It is cleared in full on a fixed interval, so a
//! marker that is still visible after a clear may be dispatched again: this
//! is an at-most-once-per-window guarantee, not exactly-once.

use std::{collections::BTreeSet, sync::Arc};

use boardmark_doc::Identity;
use tracing::{debug, warn};

use crate::{Error, store::KeyValueStore};

/// Write-through dedup set.
pub struct DedupStore {
    /// Identities dispatched since the last clear.
    seen: BTreeSet<Identity>,
    /// Durable backing store.
    store: Arc<dyn KeyValueStore>,
    /// Key the JSON array lives under.
    key: String,
}

impl DedupStore {
    /// Load the persisted set under `key`.
    ///
    /// Any read or decode failure yields an empty set.
    pub fn load(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        let seen = match store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Identity>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    warn!(key, error = %e, "discarding undecodable dedup state");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!(key, error = %e, "dedup state unreadable; starting empty");
                BTreeSet::new()
            }
        };
        debug!(key, entries = seen.len(), "dedup_loaded");
        Self {
            seen,
            store,
            key: key.to_string(),
        }
    }

    /// True if `id` has not been dispatched since the last clear.
    pub fn is_new(&self, id: &Identity) -> bool {
        !self.seen.contains(id)
    }

    /// Record `id` and persist the set.
    pub fn mark_dispatched(&mut self, id: &Identity) {
        if self.seen.insert(id.clone()) {
            self.persist();
        }
    }

    /// Check and mark in one step. Returns `true` if `id` was new.
    pub fn admit(&mut self, id: &Identity) -> bool {
        if !self.is_new(id) {
            return false;
        }
        self.mark_dispatched(id);
        true
    }

    /// Drop every identity and persist the empty set.
    pub fn clear_all(&mut self) {
        let dropped = self.seen.len();
        self.seen.clear();
        self.persist();
        debug!(key = %self.key, dropped, "dedup_cleared");
    }

    /// Number of remembered identities.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True if nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Write the current set; failures are logged, the in-memory set stays
    /// authoritative.
    fn persist(&self) {
        let result = serde_json::to_string(&self.seen)
            .map_err(Error::from)
            .and_then(|raw| self.store.set(&self.key, &raw));
        if let Err(e) = result {
            warn!(key = %self.key, error = %e, "failed to persist dedup state");
        }
    }
}
