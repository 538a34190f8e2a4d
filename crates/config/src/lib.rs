//! Configuration for boardmark: polling periods, time-request limits, host
//! hook names, the meme table and style catalogs.
//!
//! Configs are RON files. Every section is optional and falls back to the
//! values the scripts have always used.

use std::{
    collections::BTreeMap,
    env,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

mod defaults;
mod error;
mod loader;
mod types;

#[cfg(test)]
mod test_parse;

pub use error::Error;
pub use loader::{load_from_path, load_from_str, load_or_default};
pub use types::{HostConfig, ScanConfig, StyleConfig, TimeConfig};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Polling periods.
    pub scan: ScanConfig,
    /// `!t!` limits and pacing.
    pub time: TimeConfig,
    /// Host page hooks.
    pub host: HostConfig,
    /// Meme id to image URL table (ids are matched case-insensitively).
    pub memes: BTreeMap<String, String>,
    /// Style catalogs and auto-randomize flags.
    pub style: StyleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            time: TimeConfig::default(),
            host: HostConfig::default(),
            memes: types::default_memes(),
            style: StyleConfig::default(),
        }
    }
}

impl Config {
    /// Check values that parse but cannot drive the engine.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |field: &str, message: &str| Error::Validation {
            path: None,
            field: field.to_string(),
            message: message.to_string(),
        };
        let periods = [
            ("scan.image_ms", self.scan.image_ms),
            ("scan.meme_ms", self.scan.meme_ms),
            ("scan.url_ms", self.scan.url_ms),
            ("scan.time_ms", self.scan.time_ms),
            ("scan.moves_ms", self.scan.moves_ms),
            ("scan.clear_interval_secs", self.scan.clear_interval_secs),
        ];
        for (field, v) in periods {
            if v == 0 {
                return Err(invalid(field, "period must be greater than zero"));
            }
        }
        if self.time.increment == 0 {
            return Err(invalid("time.increment", "must be greater than zero"));
        }
        if self.time.max_seconds == 0 {
            return Err(invalid("time.max_seconds", "must be greater than zero"));
        }
        if self.style.piece_sets.is_empty() {
            return Err(invalid("style.piece_sets", "catalog is empty"));
        }
        if self.style.board_themes.is_empty() {
            return Err(invalid("style.board_themes", "catalog is empty"));
        }
        if self.style.history_limit == 0 {
            return Err(invalid("style.history_limit", "must be greater than zero"));
        }
        if self.host.chat_container_class.trim().is_empty() {
            return Err(invalid("host.chat_container_class", "must not be empty"));
        }
        Ok(())
    }

    /// Render as pretty JSON (for `check --dump`).
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Determine the preferred user config path (`~/.boardmark/config.ron`).
pub fn default_config_path() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".boardmark");
    p.push("config.ron");
    p
}

/// Resolve the effective config path using the default policy.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `~/.boardmark/config.ron` when it exists.
/// 3) Else `None`: run on built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let preferred = default_config_path();
    preferred.exists().then_some(preferred)
}
