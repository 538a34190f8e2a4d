//! Durable key-value storage scoped to a page origin.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{Error, Result};

/// String key-value storage that survives reloads.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`; `Ok(None)` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store. Clones share contents, so a "reload" can be simulated by
/// building new components over a clone.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// Shared contents.
    entries: Arc<Mutex<HashMap<String, String>>>,
    /// Fail every read when set.
    fail_reads: Arc<AtomicBool>,
    /// Fail every write when set.
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reads fail (or succeed again).
    pub fn set_fail_reads(&self, v: bool) {
        self.fail_reads.store(v, Ordering::SeqCst);
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, v: bool) {
        self.fail_writes.store(v, Ordering::SeqCst);
    }

    /// Raw value under `key`, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Overwrite `key` directly, bypassing failure injection.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage {
                key: key.to_string(),
                message: "read failure injected".to_string(),
            });
        }
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage {
                key: key.to_string(),
                message: "write failure injected".to_string(),
            });
        }
        self.insert_raw(key, value);
        Ok(())
    }
}

/// One file per key under `<base>/<origin>/`.
#[derive(Clone, Debug)]
pub struct FileStore {
    /// Origin-scoped directory.
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `base`, scoped to `origin` (e.g. `lichess.org`).
    pub fn new(base: &Path, origin: &str) -> Self {
        Self {
            dir: base.join(sanitize(origin)),
        }
    }

    /// Directory holding this origin's keys.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let write = || -> io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            fs::write(self.path_for(key), value)
        };
        write().map_err(|e| Error::Storage {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

/// Keep names filesystem-safe.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{env, process};

    use super::*;

    #[test]
    fn memory_store_clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
        b.set_fail_reads(true);
        assert!(a.get("k").is_err());
    }

    #[test]
    fn file_store_round_trips_and_reports_absence() {
        let base = env::temp_dir().join(format!("boardmark-store-{}", process::id()));
        let store = FileStore::new(&base, "https://lichess.org");
        assert!(store.get("missing").unwrap().is_none());
        store.set("lila-preferences", "{\"theme\":\"blue\"}").unwrap();
        assert_eq!(
            store.get("lila-preferences").unwrap().as_deref(),
            Some("{\"theme\":\"blue\"}")
        );
        assert!(store.dir().ends_with("https___lichess.org"));
        let _ignored = fs::remove_dir_all(&base);
    }
}
