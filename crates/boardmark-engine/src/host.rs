//! Capabilities the engine needs from the host page.
//!
//! The engine never knows selectors. Adapters answer "how many moves", "which
//! side am I", "whose turn is it", press the add-time control, and read or
//! write the board style.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Result, history::StyleSnapshot};

/// A side of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Moves first.
    White,
    /// Moves second.
    Black,
}

impl Color {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Side that plays ply `index` (0-based; White plays even plies).
    pub fn of_ply(index: u64) -> Self {
        if index % 2 == 0 {
            Self::White
        } else {
            Self::Black
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::White => "white",
            Self::Black => "black",
        })
    }
}

/// The rate-limited "give opponent more time" control.
pub trait TimeControl: Send + Sync {
    /// True if the control is present on the page right now.
    fn is_available(&self) -> bool;
    /// Press the control once.
    fn add_time(&self) -> Result<()>;
}

/// Read-only game signals.
pub trait GameSignals: Send + Sync {
    /// Plies played so far, or `None` when the move list is absent.
    fn move_count(&self) -> Option<u32>;
    /// Local player's side from board orientation, if conclusive.
    fn local_color(&self) -> Option<Color>;
    /// Side whose clock is running, if shown.
    fn side_to_move(&self) -> Option<Color>;
}

/// Applies and reports the board's piece set and theme.
pub trait StyleSink: Send + Sync {
    /// Apply `style` to the page.
    fn apply(&self, style: &StyleSnapshot) -> Result<()>;
    /// Piece set currently shown, if detectable.
    fn current_piece_set(&self) -> Option<String>;
    /// Board theme currently shown, if detectable.
    fn current_board_theme(&self) -> Option<String>;
}

/// Bundle of host adapters handed to the engine.
#[derive(Clone)]
pub struct Host {
    /// Add-time control.
    pub time: Arc<dyn TimeControl>,
    /// Move count and colors.
    pub signals: Arc<dyn GameSignals>,
    /// Board style.
    pub style: Arc<dyn StyleSink>,
}

impl Host {
    /// Build from concrete adapters.
    pub fn new(
        time: Arc<dyn TimeControl>,
        signals: Arc<dyn GameSignals>,
        style: Arc<dyn StyleSink>,
    ) -> Self {
        Self {
            time,
            signals,
            style,
        }
    }
}
