//! boardmark engine
//!
//! Coordinates everything that reacts to the host page:
//! - scans chat text for markers and dispatches each at most once
//! - remembers dispatched time requests across reloads, clearing hourly
//! - tracks plies to tell our moves from the opponent's
//! - randomizes the board style on those moves, with undo/redo
//!
//! [`Engine`] is the type you construct and drive. The building blocks are
//! public so hosts and tests can compose them directly.
use std::{ops::ControlFlow, sync::Arc, time::Duration};

use boardmark_doc::Dom;
use boardmark_grammar::MemeTable;
use config::Config;
use parking_lot::Mutex;
use rand::{SeedableRng, rngs::StdRng};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

mod clicks;
mod dedup;
mod dispatch;
mod error;
mod history;
mod host;
pub mod mock;
mod randomize;
mod scanner;
mod store;
mod ticker;
mod turn;

pub use clicks::{CLICK_PREFIX, click_ticker_id, start_clicks};
pub use dedup::DedupStore;
pub use dispatch::{Dispatcher, FEEDBACK_PREFIX, HostProbe, Outcome, SkipReason, route_time};
pub use error::{Error, Result};
pub use history::{StyleHistory, StyleSnapshot};
pub use host::{Color, GameSignals, Host, StyleSink, TimeControl};
pub use randomize::{ControlState, RandomizeController};
pub use scanner::{Grammar, Pipeline, ScanReport, Scanner};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use ticker::Ticker;
pub use turn::{Mover, TurnEvent, TurnObservation, TurnState, TurnTracker};

/// Ticker id of the move poll.
const MOVES_TICKER: &str = "moves";
/// Ticker id of the periodic dedup clear.
const DEDUP_CLEAR_TICKER: &str = "dedup-clear";
/// Ticker id prefix of the scan pipelines.
const SCAN_PREFIX: &str = "scan:";
/// Poll step for [`Engine::wait_idle`].
const IDLE_POLL_MS: u64 = 10;

/// Engine over a shared document and a set of host adapters.
///
/// Construct via [`Engine::new`], then either call [`Engine::start`] to run
/// every pipeline on its own timer, or drive passes by hand with
/// [`Engine::scan_all`] and [`Engine::check_moves`].
pub struct Engine<D> {
    /// Scanned and mutated document.
    doc: Arc<Mutex<D>>,
    /// Effective configuration.
    config: Arc<Config>,
    /// Host adapters.
    host: Host,
    /// Every timer the engine owns.
    ticker: Ticker,
    /// Time request dedup set.
    dedup: Arc<Mutex<DedupStore>>,
    /// Scan, parse, dispatch.
    scanner: Arc<Scanner<D>>,
    /// Ply state.
    turns: Arc<Mutex<TurnTracker>>,
    /// Style picks and history.
    randomizer: Arc<Mutex<RandomizeController>>,
}

impl<D> Clone for Engine<D> {
    fn clone(&self) -> Self {
        Self {
            doc: Arc::clone(&self.doc),
            config: Arc::clone(&self.config),
            host: self.host.clone(),
            ticker: self.ticker.clone(),
            dedup: Arc::clone(&self.dedup),
            scanner: Arc::clone(&self.scanner),
            turns: Arc::clone(&self.turns),
            randomizer: Arc::clone(&self.randomizer),
        }
    }
}

impl<D: Dom + 'static> Engine<D> {
    /// Build an engine. Dedup state is loaded from `store` immediately.
    pub fn new(doc: Arc<Mutex<D>>, config: Config, host: Host, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_rng(doc, config, host, store, StdRng::from_entropy())
    }

    /// Build an engine whose style picks come from `rng`.
    pub fn with_rng(
        doc: Arc<Mutex<D>>,
        config: Config,
        host: Host,
        store: Arc<dyn KeyValueStore>,
        rng: StdRng,
    ) -> Self {
        let ticker = Ticker::new();
        let dedup = Arc::new(Mutex::new(DedupStore::load(
            Arc::clone(&store),
            &config.host.dedup_storage_key,
        )));
        let dispatcher = Dispatcher::new(
            Arc::clone(&doc),
            host.clone(),
            ticker.clone(),
            Arc::clone(&dedup),
            config.host.clone(),
            config.time.clone(),
        );
        let grammar = Grammar::new(MemeTable::new(&config.memes), config.time.max_seconds);
        let scanner = Scanner::new(
            Arc::clone(&doc),
            grammar,
            dispatcher,
            config.host.chat_container_class.clone(),
        );
        let randomizer = RandomizeController::with_rng(
            config.style.clone(),
            &config.host.preferences_storage_key,
            Arc::clone(&host.style),
            store,
            rng,
        );
        Self {
            doc,
            config: Arc::new(config),
            host,
            ticker,
            dedup,
            scanner: Arc::new(scanner),
            turns: Arc::new(Mutex::new(TurnTracker::new())),
            randomizer: Arc::new(Mutex::new(randomizer)),
        }
    }

    /// Shared document handle.
    pub fn document(&self) -> Arc<Mutex<D>> {
        Arc::clone(&self.doc)
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one pipeline once.
    pub fn scan_once(&self, pipeline: Pipeline) -> ScanReport {
        self.scanner.scan_once(pipeline)
    }

    /// Run every pipeline once, in [`Pipeline::ALL`] order.
    pub fn scan_all(&self) -> ScanReport {
        let mut report = ScanReport::default();
        for p in Pipeline::ALL {
            report.merge(self.scan_once(p));
        }
        report
    }

    /// Poll the move count and react to a new ply.
    pub fn check_moves(&self) -> TurnObservation {
        check_moves(&self.host, &self.turns, &self.randomizer)
    }

    /// Move list mutation hook: an immediate check on top of the poll.
    pub fn notify_moves_changed(&self) -> TurnObservation {
        self.check_moves()
    }

    /// Forget every dispatched time request.
    pub fn clear_dedup(&self) {
        self.dedup.lock().clear_all();
    }

    /// Number of remembered time requests.
    pub fn dedup_len(&self) -> usize {
        self.dedup.lock().len()
    }

    /// Current turn state, if initialized.
    pub fn turn_state(&self) -> Option<TurnState> {
        self.turns.lock().state().copied()
    }

    /// Seed style history from the page.
    pub fn init_style(&self) -> StyleSnapshot {
        self.randomizer.lock().init_from_host()
    }

    /// Pick and apply a new style now.
    pub fn randomize(&self) -> Result<StyleSnapshot> {
        self.randomizer.lock().randomize()
    }

    /// Re-apply the previous style.
    pub fn back(&self) -> Result<Option<StyleSnapshot>> {
        self.randomizer.lock().back()
    }

    /// Re-apply the next style.
    pub fn forward(&self) -> Result<Option<StyleSnapshot>> {
        self.randomizer.lock().forward()
    }

    /// Flip randomize-on-my-move; returns the new value.
    pub fn toggle_on_my_move(&self) -> bool {
        self.randomizer.lock().toggle_on_my_move()
    }

    /// Flip randomize-on-opponent-move; returns the new value.
    pub fn toggle_on_opponent_move(&self) -> bool {
        self.randomizer.lock().toggle_on_opponent_move()
    }

    /// Button and checkbox state.
    pub fn control_state(&self) -> ControlState {
        self.randomizer.lock().control_state()
    }

    /// Click sequences still pressing.
    pub fn pending_clicks(&self) -> usize {
        self.ticker.active_with_prefix(CLICK_PREFIX).len()
    }

    /// Start every periodic task. Must be called inside a tokio runtime.
    /// Calling it again restarts the timers.
    pub fn start(&self) {
        self.init_style();
        let scan = &self.config.scan;
        for (pipeline, ms) in [
            (Pipeline::Meme, scan.meme_ms),
            (Pipeline::Image, scan.image_ms),
            (Pipeline::Url, scan.url_ms),
            (Pipeline::Time, scan.time_ms),
        ] {
            let period = Duration::from_millis(ms);
            let scanner = Arc::clone(&self.scanner);
            self.ticker
                .start(format!("{SCAN_PREFIX}{pipeline}"), period, period, move || {
                    scanner.scan_once(pipeline);
                    ControlFlow::Continue(())
                });
        }

        let period = Duration::from_millis(scan.moves_ms);
        let host = self.host.clone();
        let turns = Arc::clone(&self.turns);
        let randomizer = Arc::clone(&self.randomizer);
        self.ticker.start(MOVES_TICKER, period, period, move || {
            check_moves(&host, &turns, &randomizer);
            ControlFlow::Continue(())
        });

        let period = scan.clear_interval();
        let dedup = Arc::clone(&self.dedup);
        self.ticker.start(DEDUP_CLEAR_TICKER, period, period, move || {
            dedup.lock().clear_all();
            ControlFlow::Continue(())
        });
        info!(
            pipelines = Pipeline::ALL.len(),
            moves_ms = scan.moves_ms,
            clear_secs = scan.clear_interval_secs,
            "engine started"
        );
    }

    /// Wait until no click sequence or feedback revert is pending, up to
    /// `timeout`. Returns `true` if idle.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let busy = self.pending_clicks()
                + self.ticker.active_with_prefix(FEEDBACK_PREFIX).len();
            if busy == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                warn!(busy, "engine still busy at deadline");
                return false;
            }
            time::sleep(Duration::from_millis(IDLE_POLL_MS)).await;
        }
    }

    /// Cancel every timer, pending click sequences included.
    pub async fn shutdown(&self) {
        self.ticker.clear_async().await;
        debug!("engine stopped");
    }
}

/// Shared body of the move poll and the mutation hook.
fn check_moves(
    host: &Host,
    turns: &Mutex<TurnTracker>,
    randomizer: &Mutex<RandomizeController>,
) -> TurnObservation {
    let observation = turns.lock().poll(host.signals.as_ref());
    if let TurnObservation::Moved(event) = observation {
        debug!(ply = event.ply_index, mover = ?event.mover, "move detected");
    }
    randomizer.lock().on_turn(&observation);
    observation
}
