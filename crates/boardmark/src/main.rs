//! Binary entrypoint for boardmark.
//!
//! `check` validates a configuration. `scan` loads a page fixture, runs every
//! pipeline over it once, waits for pending add-time presses, and prints the
//! resulting tree.
use std::{
    fs,
    path::{Path, PathBuf},
    process,
    sync::Arc,
    time::Duration,
};

use boardmark_doc::{Document, fixture};
use boardmark_engine::{Color, Engine, FileStore, KeyValueStore, MemoryStore, ScanReport};
use clap::{Parser, Subcommand, ValueEnum};
use config::{Config, load_or_default, resolve_config_path};
use logging::LogArgs;
use parking_lot::Mutex;
use tracing::{debug, warn};

mod adapters;

/// Upper bound on waiting for click sequences after a scan.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "boardmark", about = "Chat marker scanning for chess pages", version)]
/// Command-line interface for the `boardmark` binary.
struct Cli {
    /// Subcommand.
    #[command(subcommand)]
    command: Command,

    /// Logging controls
    #[command(flatten)]
    log: LogArgs,

    /// Optional path to the config file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Load and validate the configuration then exit.
    Check {
        /// Path to configuration file to check (defaults to ~/.boardmark/config.ron)
        path: Option<PathBuf>,

        /// Dump the effective configuration as JSON to stdout
        #[arg(long)]
        dump: bool,
    },
    /// Run every pipeline once over a JSON page fixture.
    Scan {
        /// Page fixture (JSON document description)
        doc: PathBuf,

        /// Directory for durable state; in-memory when absent
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,

        /// Origin the durable state is scoped to
        #[arg(long, default_value = "lichess.org")]
        origin: String,

        /// Local colour, overriding the board orientation
        #[arg(long, value_enum)]
        color: Option<ColorArg>,

        /// Pick a new board style after scanning
        #[arg(long)]
        randomize: bool,
    },
}

/// Board side as a CLI value.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorArg {
    /// White
    White,
    /// Black
    Black,
}

impl From<ColorArg> for Color {
    fn from(c: ColorArg) -> Self {
        match c {
            ColorArg::White => Self::White,
            ColorArg::Black => Self::Black,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    match &cli.command {
        Command::Check { path, dump } => {
            let explicit = path.as_deref().or(cli.config.as_deref());
            let cfg = load_config(explicit);
            if *dump {
                println!("{}", cfg.to_json());
            } else {
                println!("OK");
            }
        }
        Command::Scan {
            doc,
            store,
            origin,
            color,
            randomize,
        } => {
            let cfg = load_config(cli.config.as_deref());
            if let Err(e) = run_scan(cfg, doc, store.as_deref(), origin, *color, *randomize).await {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    }
}

/// Resolve and load a config, exiting with a pretty error on failure.
fn load_config(explicit: Option<&Path>) -> Config {
    let resolved = resolve_config_path(explicit);
    debug!(path = ?resolved, "loading config");
    match load_or_default(resolved.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e.pretty());
            process::exit(1);
        }
    }
}

/// Body of the `scan` subcommand.
async fn run_scan(
    cfg: Config,
    doc_path: &Path,
    store_dir: Option<&Path>,
    origin: &str,
    color: Option<ColorArg>,
    randomize: bool,
) -> boardmark_engine::Result<()> {
    let raw = fs::read_to_string(doc_path)?;
    let doc = Arc::new(Mutex::new(fixture::from_json(&raw)?));
    let store: Arc<dyn KeyValueStore> = match store_dir {
        Some(dir) => Arc::new(FileStore::new(dir, origin)),
        None => Arc::new(MemoryStore::new()),
    };
    let host = adapters::document_host(&doc, color.map(Color::from));
    let engine: Engine<Document> = Engine::new(Arc::clone(&doc), cfg, host, store);

    engine.init_style();
    engine.check_moves();
    let report = engine.scan_all();
    if randomize {
        let style = engine.randomize()?;
        println!("style: {style}");
    }
    if !engine.wait_idle(IDLE_TIMEOUT).await {
        warn!("click sequences still pending; stopping them");
    }
    engine.shutdown().await;

    let doc = doc.lock();
    print!("{}", doc.outline(doc.root()));
    print_report(&report);
    Ok(())
}

/// One-line summary of a combined pass.
fn print_report(report: &ScanReport) {
    println!(
        "examined {} dispatched {} skipped {} unmatched {} failed {}",
        report.examined, report.dispatched, report.skipped, report.unmatched, report.failed
    );
}
