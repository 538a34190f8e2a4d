#![warn(missing_docs)]

//! Shared logging helpers, CLI argument definitions, and tracing setup for the boardmark workspace.

use std::{env, io};

use clap::Args;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logging controls for CLI apps.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Set global log level to trace (our crates only)
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Set global log level to debug (our crates only)
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Set a single global log level for our crates (error|warn|info|debug|trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Set an explicit tracing filter directive (overrides other flags)
    /// e.g. "boardmark_engine=trace,boardmark=debug"
    #[arg(long)]
    pub log_filter: Option<String>,
}

/// List of crate targets that constitute "our" logs.
pub fn our_crates() -> &'static [&'static str] {
    &[
        "boardmark",
        "boardmark_engine",
        "boardmark_grammar",
        "boardmark_doc",
        "config",
        "logging",
    ]
}

/// Build a filter directive string that sets the same `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let lvl = level.to_ascii_lowercase();
    our_crates()
        .iter()
        .map(|t| format!("{}={}", t, lvl))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute the final filter spec string with precedence:
/// - `log_filter`
/// - `trace`/`debug`/`log_level` (crate-scoped)
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if trace {
        return level_spec_for("trace");
    }
    if debug {
        return level_spec_for("debug");
    }
    if let Some(lvl) = log_level {
        return level_spec_for(lvl);
    }
    env::var("RUST_LOG").unwrap_or_else(|_| level_spec_for("info"))
}

/// Create an `EnvFilter` from a spec string.
pub fn env_filter_from_spec(spec: &str) -> EnvFilter {
    EnvFilter::new(spec)
}

/// Install a compact stderr subscriber filtered according to `args`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(args: &LogArgs) {
    let spec = compute_spec(
        args.trace,
        args.debug,
        args.log_level.as_deref(),
        args.log_filter.as_deref(),
    );
    let _ignored = tracing_subscriber::registry()
        .with(env_filter_from_spec(&spec))
        .with(
            fmt::layer()
                .compact()
                .without_time()
                .with_writer(io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        assert_eq!(
            compute_spec(true, true, Some("warn"), Some("boardmark=trace")),
            "boardmark=trace"
        );
    }

    #[test]
    fn level_flags_are_crate_scoped() {
        let spec = compute_spec(false, true, None, None);
        assert!(spec.contains("boardmark_engine=debug"));
        assert!(spec.split(',').all(|d| d.ends_with("=debug")));
        assert_eq!(level_spec_for("WARN"), compute_spec(false, false, Some("warn"), None));
    }
}
