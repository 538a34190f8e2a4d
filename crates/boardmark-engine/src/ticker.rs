//! Ticker for scheduling repeated actions with cancellation support.
//!
//! Every polling pipeline, the hourly dedup clear, click sequences and
//! feedback reverts run as named entries on one [`Ticker`]. An entry runs its
//! callback after an initial delay and then on each interval tick until the
//! callback returns [`ControlFlow::Break`] or the entry is stopped.

use std::{
    collections::HashMap,
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Upper bound when awaiting a cancelled task.
pub const STOP_WAIT_TIMEOUT_MS: u64 = 50;

/// One scheduled task.
struct TickerEntry {
    /// Cancels the task.
    token: CancellationToken,
    /// Task handle, awaited on clear.
    handle: JoinHandle<()>,
    /// Distinguishes this entry from a later replacement under the same id.
    generation: u64,
}

/// Named, cancellable timers on the tokio runtime.
#[derive(Clone, Default)]
pub struct Ticker {
    /// Live entries by id.
    entries: Arc<Mutex<HashMap<String, TickerEntry>>>,
    /// Source of entry generations.
    next_generation: Arc<AtomicU64>,
}

impl Ticker {
    /// Create an empty ticker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a ticker is active for the given id.
    pub fn is_active(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Ids of active entries starting with `prefix`, sorted.
    pub fn active_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Start or replace a ticker for `id`.
    ///
    /// `on_tick` first runs after `initial`, then every `interval`. Returning
    /// [`ControlFlow::Break`] ends the entry and removes it.
    pub fn start<F>(&self, id: impl Into<String>, initial: Duration, interval: Duration, mut on_tick: F)
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let id = id.into();
        // Replace any existing ticker for this id
        self.stop(&id);

        let token = CancellationToken::new();
        let cancel = token.clone();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entries = Arc::clone(&self.entries);
        let id_for_task = id.clone();

        let fut = async move {
            trace!(
                "ticker_start" = %id_for_task,
                init_ms = initial.as_millis(),
                int_ms = interval.as_millis()
            );

            tokio::select! {
                _ = time::sleep(initial) => {}
                _ = cancel.cancelled() => {
                    trace!("ticker_cancelled_initial" = %id_for_task);
                    return;
                }
            }

            // `time::interval` rejects a zero period.
            let mut ticker = time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        trace!("ticker_cancelled" = %id_for_task);
                        return;
                    }
                    _ = ticker.tick() => {
                        if on_tick().is_break() {
                            break;
                        }
                    }
                }
            }

            // Finished on its own: drop our entry unless it was replaced.
            let mut map = entries.lock();
            if map.get(&id_for_task).is_some_and(|e| e.generation == generation) {
                map.remove(&id_for_task);
            }
            trace!("ticker_done" = %id_for_task);
        };

        // Hold the lock across spawn so a zero-delay task cannot finish and
        // look for its entry before it is inserted.
        let mut map = self.entries.lock();
        let handle = tokio::spawn(fut);
        map.insert(
            id,
            TickerEntry {
                token,
                handle,
                generation,
            },
        );
    }

    /// Run `f` once after `delay` under `id`, replacing any entry with that id.
    pub fn after<F>(&self, id: impl Into<String>, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut f = Some(f);
        self.start(id, delay, Duration::from_millis(1), move || {
            if let Some(f) = f.take() {
                f();
            }
            ControlFlow::Break(())
        });
    }

    /// Stop a ticker if present (non-blocking).
    pub fn stop(&self, id: &str) {
        if let Some(entry) = self.entries.lock().remove(id) {
            entry.token.cancel();
            trace!("ticker_stop" = %id);
        }
    }

    /// Cancel and wait for all tickers to finish.
    pub async fn clear_async(&self) {
        let entries: Vec<TickerEntry> = {
            let mut map = self.entries.lock();
            map.drain().map(|(_, e)| e).collect()
        };

        for e in &entries {
            e.token.cancel();
        }

        for e in entries {
            let _ignored =
                time::timeout(Duration::from_millis(STOP_WAIT_TIMEOUT_MS), e.handle).await;
        }
        trace!("ticker_clear_async");
    }
}
