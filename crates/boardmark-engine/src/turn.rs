//! Ply tracking: who made the move that just appeared.
//!
//! Ply `i` (0-based) is White's when `i` is even. After `n` plies the latest
//! one has index `n - 1`, so the first move of a game (count 0 to 1) is
//! White's.

use tracing::{debug, info, trace};

use crate::host::{Color, GameSignals};

/// Whose move a ply was, from the local player's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mover {
    /// The local player moved.
    Mine,
    /// The opponent moved.
    Opponent,
}

/// Tracker state once a move count has been seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnState {
    /// Move count at the last observation.
    pub last_observed_move_count: u32,
    /// Plies played so far; differs from the count only when the side to
    /// move contradicted count parity at initialization.
    pub plies_played: u64,
    /// Local side, once detected.
    pub local_color: Option<Color>,
}

/// A newly observed, classified ply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnEvent {
    /// Index of the latest ply.
    pub ply_index: u64,
    /// Side that played it.
    pub mover_color: Color,
    /// Local classification.
    pub mover: Mover,
    /// Plies that appeared since the previous observation; only the latest
    /// is classified.
    pub plies: u64,
}

/// Result of one observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnObservation {
    /// First count seen; nothing to classify yet.
    Initialized,
    /// Count did not change.
    Unchanged,
    /// Count increased and the local colour is known.
    Moved(TurnEvent),
    /// Count decreased (takeback or new game); state follows the new count.
    Resynced {
        /// The new count.
        count: u32,
    },
    /// Count increased but the local colour is unknown.
    Unclassified {
        /// The new count.
        count: u32,
    },
    /// The host shows no move list.
    NoSignal,
}

/// Move-count state machine.
#[derive(Clone, Debug, Default)]
pub struct TurnTracker {
    /// `None` until the first count arrives.
    state: Option<TurnState>,
}

impl TurnTracker {
    /// Uninitialized tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, if initialized.
    pub fn state(&self) -> Option<&TurnState> {
        self.state.as_ref()
    }

    /// Local colour, if known.
    pub fn local_color(&self) -> Option<Color> {
        self.state.and_then(|s| s.local_color)
    }

    /// Start tracking at `count` moves.
    ///
    /// When `to_move` is known it wins over count parity: the next ply must
    /// belong to `to_move`, and if the count implies otherwise one ply is
    /// assumed to be missing from the count.
    pub fn initialize_with(&mut self, count: u32, local: Option<Color>, to_move: Option<Color>) {
        let mut plies = u64::from(count);
        if let Some(side) = to_move
            && Color::of_ply(plies) != side
        {
            debug!(count, to_move = %side, "move count parity disagrees with clock; adjusting");
            plies += 1;
        }
        self.state = Some(TurnState {
            last_observed_move_count: count,
            plies_played: plies,
            local_color: local,
        });
        info!(
            count,
            plies,
            local = ?local,
            "turn tracking initialized"
        );
    }

    /// Record a newly detected local colour.
    pub fn set_local_color(&mut self, color: Option<Color>) {
        if let Some(s) = self.state.as_mut() {
            s.local_color = color;
        }
    }

    /// Classify ply `index` for the local player.
    pub fn mover_of(&self, index: u64) -> Option<Mover> {
        let local = self.local_color()?;
        Some(if Color::of_ply(index) == local {
            Mover::Mine
        } else {
            Mover::Opponent
        })
    }

    /// Feed a move count. The first call initializes from count parity.
    pub fn observe(&mut self, count: u32) -> TurnObservation {
        let Some(state) = self.state.as_mut() else {
            self.initialize_with(count, None, None);
            return TurnObservation::Initialized;
        };
        let last = state.last_observed_move_count;
        if count == last {
            return TurnObservation::Unchanged;
        }
        if count < last {
            let removed = u64::from(last - count);
            state.plies_played = state.plies_played.saturating_sub(removed);
            state.last_observed_move_count = count;
            debug!(from = last, to = count, "move count decreased; resynced");
            return TurnObservation::Resynced { count };
        }

        let delta = u64::from(count - last);
        state.plies_played += delta;
        state.last_observed_move_count = count;
        let ply_index = state.plies_played - 1;
        let mover_color = Color::of_ply(ply_index);
        match self.mover_of(ply_index) {
            Some(mover) => {
                trace!(ply_index, mover = ?mover, "ply observed");
                TurnObservation::Moved(TurnEvent {
                    ply_index,
                    mover_color,
                    mover,
                    plies: delta,
                })
            }
            None => TurnObservation::Unclassified { count },
        }
    }

    /// Read the host signals and observe. Re-detects the local colour while
    /// it is unknown.
    pub fn poll(&mut self, signals: &dyn GameSignals) -> TurnObservation {
        let Some(count) = signals.move_count() else {
            return TurnObservation::NoSignal;
        };
        if self.state.is_none() {
            self.initialize_with(count, signals.local_color(), signals.side_to_move());
            return TurnObservation::Initialized;
        }
        if self.local_color().is_none() {
            self.set_local_color(signals.local_color());
        }
        self.observe(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGameSignals;

    fn movers(tracker: &mut TurnTracker, counts: &[u32]) -> Vec<Option<Mover>> {
        counts
            .iter()
            .map(|c| match tracker.observe(*c) {
                TurnObservation::Moved(ev) => Some(ev.mover),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn first_move_of_game_is_whites() {
        let mut t = TurnTracker::new();
        t.initialize_with(0, Some(Color::White), None);
        assert_eq!(
            movers(&mut t, &[1, 2, 3]),
            vec![Some(Mover::Mine), Some(Mover::Opponent), Some(Mover::Mine)]
        );

        let mut t = TurnTracker::new();
        t.initialize_with(0, Some(Color::Black), None);
        assert_eq!(
            movers(&mut t, &[1, 2, 3]),
            vec![Some(Mover::Opponent), Some(Mover::Mine), Some(Mover::Opponent)]
        );
    }

    #[test]
    fn side_to_move_overrides_count_parity() {
        // Four plies on the board, but Black's clock runs: one ply is
        // missing from the count.
        let mut t = TurnTracker::new();
        t.initialize_with(4, Some(Color::White), Some(Color::Black));
        assert_eq!(t.state().map(|s| s.plies_played), Some(5));
        match t.observe(5) {
            TurnObservation::Moved(ev) => {
                assert_eq!(ev.mover_color, Color::Black);
                assert_eq!(ev.mover, Mover::Opponent);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut agreeing = TurnTracker::new();
        agreeing.initialize_with(4, Some(Color::White), Some(Color::White));
        assert_eq!(agreeing.state().map(|s| s.plies_played), Some(4));
    }

    #[test]
    fn jumps_classify_latest_ply_and_decreases_resync() {
        let mut t = TurnTracker::new();
        t.initialize_with(2, Some(Color::Black), None);
        match t.observe(5) {
            TurnObservation::Moved(ev) => {
                assert_eq!((ev.ply_index, ev.plies), (4, 3));
                assert_eq!(ev.mover, Mover::Opponent);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(t.observe(5), TurnObservation::Unchanged);
        assert_eq!(t.observe(3), TurnObservation::Resynced { count: 3 });
        assert!(matches!(
            t.observe(4),
            TurnObservation::Moved(TurnEvent { mover: Mover::Mine, .. })
        ));
    }

    #[test]
    fn unknown_colour_is_unclassified_until_detected() {
        let signals = MockGameSignals::with(0, None);
        let mut t = TurnTracker::new();
        assert_eq!(t.poll(&signals), TurnObservation::Initialized);
        signals.set_move_count(Some(1));
        assert_eq!(t.poll(&signals), TurnObservation::Unclassified { count: 1 });

        signals.set_local_color(Some(Color::Black));
        signals.set_move_count(Some(2));
        assert!(matches!(
            t.poll(&signals),
            TurnObservation::Moved(TurnEvent { mover: Mover::Mine, .. })
        ));

        signals.set_move_count(None);
        assert_eq!(t.poll(&signals), TurnObservation::NoSignal);
    }
}
