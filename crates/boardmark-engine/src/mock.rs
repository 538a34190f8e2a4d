//! Recording host adapters for tests and dry runs.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::{
    Error, Result,
    history::StyleSnapshot,
    host::{Color, GameSignals, StyleSink, TimeControl},
};

/// Add-time control that records when it was pressed.
#[derive(Clone)]
pub struct MockTimeControl {
    /// Press timestamps (tokio clock, so paused tests see virtual time).
    clicks: Arc<Mutex<Vec<Instant>>>,
    /// Whether the control is on the page.
    available: Arc<AtomicBool>,
    /// Fail every press when set.
    fail: Arc<AtomicBool>,
}

impl Default for MockTimeControl {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTimeControl {
    /// Available control with no presses recorded.
    pub fn new() -> Self {
        Self {
            clicks: Arc::new(Mutex::new(Vec::new())),
            available: Arc::new(AtomicBool::new(true)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Show or hide the control.
    pub fn set_available(&self, v: bool) {
        self.available.store(v, Ordering::SeqCst);
    }

    /// Make presses fail.
    pub fn set_fail(&self, v: bool) {
        self.fail.store(v, Ordering::SeqCst);
    }

    /// Number of successful presses.
    pub fn click_count(&self) -> usize {
        self.clicks.lock().len()
    }

    /// Successful press timestamps in order.
    pub fn click_times(&self) -> Vec<Instant> {
        self.clicks.lock().clone()
    }
}

impl TimeControl for MockTimeControl {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn add_time(&self) -> Result<()> {
        if !self.is_available() {
            return Err(Error::MissingHostElement("add-time control".into()));
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Msg("add-time press rejected".into()));
        }
        self.clicks.lock().push(Instant::now());
        Ok(())
    }
}

/// Settable game signals. The move count is `None` until first set.
#[derive(Clone, Default)]
pub struct MockGameSignals {
    /// Move count.
    moves: Arc<Mutex<Option<u32>>>,
    /// Local color.
    local: Arc<Mutex<Option<Color>>>,
    /// Side to move.
    to_move: Arc<Mutex<Option<Color>>>,
}

impl MockGameSignals {
    /// Signals with nothing known.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals for a game in progress.
    pub fn with(moves: u32, local: Option<Color>) -> Self {
        let s = Self::new();
        s.set_move_count(Some(moves));
        s.set_local_color(local);
        s
    }

    /// Set or clear the move count.
    pub fn set_move_count(&self, moves: Option<u32>) {
        *self.moves.lock() = moves;
    }

    /// Set or clear the local color.
    pub fn set_local_color(&self, color: Option<Color>) {
        *self.local.lock() = color;
    }

    /// Set or clear the side to move.
    pub fn set_side_to_move(&self, color: Option<Color>) {
        *self.to_move.lock() = color;
    }
}

impl GameSignals for MockGameSignals {
    fn move_count(&self) -> Option<u32> {
        *self.moves.lock()
    }

    fn local_color(&self) -> Option<Color> {
        *self.local.lock()
    }

    fn side_to_move(&self) -> Option<Color> {
        *self.to_move.lock()
    }
}

/// Style sink that records applied snapshots.
#[derive(Clone, Default)]
pub struct MockStyleSink {
    /// Every applied snapshot in order.
    applied: Arc<Mutex<Vec<StyleSnapshot>>>,
    /// What the page reports before anything is applied.
    initial: Arc<Mutex<(Option<String>, Option<String>)>>,
    /// Fail every apply when set.
    fail: Arc<AtomicBool>,
}

impl MockStyleSink {
    /// Sink reporting no current style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink reporting `piece_set`/`board_theme` until something is applied.
    pub fn showing(piece_set: &str, board_theme: &str) -> Self {
        let s = Self::new();
        *s.initial.lock() = (Some(piece_set.to_string()), Some(board_theme.to_string()));
        s
    }

    /// Make applies fail.
    pub fn set_fail(&self, v: bool) {
        self.fail.store(v, Ordering::SeqCst);
    }

    /// Applied snapshots in order.
    pub fn applied(&self) -> Vec<StyleSnapshot> {
        self.applied.lock().clone()
    }
}

impl StyleSink for MockStyleSink {
    fn apply(&self, style: &StyleSnapshot) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::MissingHostElement("piece sprite".into()));
        }
        self.applied.lock().push(style.clone());
        Ok(())
    }

    fn current_piece_set(&self) -> Option<String> {
        match self.applied.lock().last() {
            Some(s) => Some(s.piece_set.clone()),
            None => self.initial.lock().0.clone(),
        }
    }

    fn current_board_theme(&self) -> Option<String> {
        match self.applied.lock().last() {
            Some(s) => Some(s.board_theme.clone()),
            None => self.initial.lock().1.clone(),
        }
    }
}
