//! Parse and load user configuration.

use std::{ffi::OsStr, fs, path::Path};

use tracing::debug;

use crate::{Config, Error};

/// Parse a configuration from RON source. Missing sections take defaults.
pub fn load_from_str(source: &str) -> Result<Config, Error> {
    let cfg: Config = ron::from_str(source).map_err(|e| Error::Parse {
        path: None,
        message: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load and validate a `.ron` configuration file at `path`.
pub fn load_from_path(path: &Path) -> Result<Config, Error> {
    if path.extension() != Some(OsStr::new("ron")) {
        return Err(Error::Read {
            path: Some(path.to_path_buf()),
            message: "Unsupported config format (expected a .ron file)".to_string(),
        });
    }
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    let cfg = load_from_str(&source).map_err(|e| e.with_path(path))?;
    debug!(path = %path.display(), "config_loaded");
    Ok(cfg)
}

/// Load the config at `path` when given, otherwise fall back to defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, Error> {
    match path {
        Some(p) => load_from_path(p),
        None => {
            debug!("config_defaults");
            Ok(Config::default())
        }
    }
}
