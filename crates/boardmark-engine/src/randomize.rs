//! Board style randomizing with undo/redo, gated on whose move it was.

use std::sync::Arc;

use config::StyleConfig;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    Error, Result,
    history::{StyleHistory, StyleSnapshot},
    host::StyleSink,
    store::KeyValueStore,
    turn::{Mover, TurnObservation},
};

/// Enablement of the manual controls and the auto-randomize options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlState {
    /// "Previous style" is enabled.
    pub can_back: bool,
    /// "Next style" is enabled.
    pub can_forward: bool,
    /// Randomize after the local player's moves.
    pub on_my_move: bool,
    /// Randomize after the opponent's moves.
    pub on_opponent_move: bool,
}

/// Picks, applies and remembers board styles.
pub struct RandomizeController {
    /// Sampling source.
    rng: StdRng,
    /// Catalogs and defaults.
    style: StyleConfig,
    /// Applied styles.
    history: StyleHistory,
    /// Page style adapter.
    sink: Arc<dyn StyleSink>,
    /// Preference mirror storage.
    store: Arc<dyn KeyValueStore>,
    /// Key of the mirrored preference object.
    prefs_key: String,
    /// Randomize after our moves.
    on_my_move: bool,
    /// Randomize after opponent moves.
    on_opponent_move: bool,
}

impl RandomizeController {
    /// Controller seeded from OS entropy.
    pub fn new(
        style: StyleConfig,
        prefs_key: &str,
        sink: Arc<dyn StyleSink>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self::with_rng(style, prefs_key, sink, store, StdRng::from_entropy())
    }

    /// Controller with an explicit random source.
    pub fn with_rng(
        style: StyleConfig,
        prefs_key: &str,
        sink: Arc<dyn StyleSink>,
        store: Arc<dyn KeyValueStore>,
        rng: StdRng,
    ) -> Self {
        Self {
            rng,
            history: StyleHistory::new(style.history_limit),
            on_my_move: style.randomize_on_my_move,
            on_opponent_move: style.randomize_on_opponent_move,
            style,
            sink,
            store,
            prefs_key: prefs_key.to_string(),
        }
    }

    /// Seed history with what the page shows now, falling back to the
    /// configured defaults. No-op once history has entries.
    pub fn init_from_host(&mut self) -> StyleSnapshot {
        if let Some(current) = self.history.current() {
            return current.clone();
        }
        let snapshot = StyleSnapshot::new(
            self.sink
                .current_piece_set()
                .unwrap_or_else(|| self.style.default_piece_set.clone()),
            self.sink
                .current_board_theme()
                .unwrap_or_else(|| self.style.default_board_theme.clone()),
        );
        debug!(style = %snapshot, "style history seeded");
        self.history.push(snapshot.clone());
        snapshot
    }

    /// React to a turn observation. Returns the new style if one was applied.
    pub fn on_turn(&mut self, observation: &TurnObservation) -> Option<StyleSnapshot> {
        let TurnObservation::Moved(event) = observation else {
            return None;
        };
        let wanted = match event.mover {
            Mover::Mine => self.on_my_move,
            Mover::Opponent => self.on_opponent_move,
        };
        if !wanted {
            return None;
        }
        match self.randomize() {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "auto-randomize failed");
                None
            }
        }
    }

    /// Sample a new style, apply it, mirror it to preferences and push it.
    pub fn randomize(&mut self) -> Result<StyleSnapshot> {
        let snapshot = self.sample();
        self.sink.apply(&snapshot)?;
        self.mirror_preferences(&snapshot);
        self.history.push(snapshot.clone());
        info!(style = %snapshot, "randomized board style");
        Ok(snapshot)
    }

    /// Re-apply the previous style. `Ok(None)` at the oldest entry.
    pub fn back(&mut self) -> Result<Option<StyleSnapshot>> {
        let Some(s) = self.history.back().cloned() else {
            return Ok(None);
        };
        self.sink.apply(&s)?;
        debug!(style = %s, "style back");
        Ok(Some(s))
    }

    /// Re-apply the next style. `Ok(None)` at the newest entry.
    pub fn forward(&mut self) -> Result<Option<StyleSnapshot>> {
        let Some(s) = self.history.forward().cloned() else {
            return Ok(None);
        };
        self.sink.apply(&s)?;
        debug!(style = %s, "style forward");
        Ok(Some(s))
    }

    /// Enable or disable randomizing after our moves.
    pub fn set_on_my_move(&mut self, v: bool) {
        self.on_my_move = v;
    }

    /// Enable or disable randomizing after opponent moves.
    pub fn set_on_opponent_move(&mut self, v: bool) {
        self.on_opponent_move = v;
    }

    /// Flip the my-move option; returns the new value.
    pub fn toggle_on_my_move(&mut self) -> bool {
        self.on_my_move = !self.on_my_move;
        self.on_my_move
    }

    /// Flip the opponent-move option; returns the new value.
    pub fn toggle_on_opponent_move(&mut self) -> bool {
        self.on_opponent_move = !self.on_opponent_move;
        self.on_opponent_move
    }

    /// Button and checkbox state.
    pub fn control_state(&self) -> ControlState {
        ControlState {
            can_back: self.history.can_back(),
            can_forward: self.history.can_forward(),
            on_my_move: self.on_my_move,
            on_opponent_move: self.on_opponent_move,
        }
    }

    /// Applied style history.
    pub fn history(&self) -> &StyleHistory {
        &self.history
    }

    /// Independent uniform picks from both catalogs.
    fn sample(&mut self) -> StyleSnapshot {
        let piece_set = pick(&mut self.rng, &self.style.piece_sets, &self.style.default_piece_set);
        let board_theme = pick(
            &mut self.rng,
            &self.style.board_themes,
            &self.style.default_board_theme,
        );
        StyleSnapshot {
            piece_set,
            board_theme,
        }
    }

    /// Merge `{pieceSet, theme}` into the stored preference object. Failures
    /// are logged only.
    fn mirror_preferences(&self, snapshot: &StyleSnapshot) {
        let merged = self.store.get(&self.prefs_key).and_then(|raw| {
            let mut prefs = raw
                .and_then(|r| serde_json::from_str::<Value>(&r).ok())
                .and_then(|v| match v {
                    Value::Object(m) => Some(m),
                    _ => None,
                })
                .unwrap_or_else(Map::new);
            prefs.insert("pieceSet".into(), Value::from(snapshot.piece_set.as_str()));
            prefs.insert("theme".into(), Value::from(snapshot.board_theme.as_str()));
            serde_json::to_string(&Value::Object(prefs)).map_err(Error::from)
        });
        let result = merged.and_then(|raw| self.store.set(&self.prefs_key, &raw));
        if let Err(e) = result {
            warn!(key = %self.prefs_key, error = %e, "failed to save preferences");
        }
    }
}

/// Uniform choice, or `fallback` for an empty catalog.
fn pick<R: Rng>(rng: &mut R, catalog: &[String], fallback: &str) -> String {
    catalog
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}
