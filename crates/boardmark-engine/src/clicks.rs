//! Paced add-time presses.

use std::{
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use boardmark_doc::Identity;
use tracing::{debug, warn};

use crate::{host::TimeControl, ticker::Ticker};

/// Ticker id prefix for click sequences.
pub const CLICK_PREFIX: &str = "clicks:";

/// Ticker id of the click sequence for `id`.
pub fn click_ticker_id(id: &Identity) -> String {
    format!("{CLICK_PREFIX}{id}")
}

/// Press `control` `count` times, one press every `delay`, the first after
/// `delay`. The sequence ends itself after the last press, or early if a
/// press fails.
///
/// The entry is keyed by `id`; starting a second sequence for the same
/// identity replaces the first. Callers admit the identity before starting
/// so this does not happen in practice.
pub fn start_clicks(
    ticker: &Ticker,
    control: Arc<dyn TimeControl>,
    id: &Identity,
    count: u64,
    delay: Duration,
) {
    if count == 0 {
        return;
    }
    let done = Arc::new(AtomicU64::new(0));
    let identity = id.clone();
    debug!(identity = %identity, count, delay_ms = delay.as_millis(), "clicks_start");
    ticker.start(click_ticker_id(id), delay, delay, move || {
        if let Err(e) = control.add_time() {
            warn!(identity = %identity, error = %e, "add-time press failed; abandoning sequence");
            return ControlFlow::Break(());
        }
        let n = done.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= count {
            debug!(identity = %identity, presses = n, "clicks_done");
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
}
