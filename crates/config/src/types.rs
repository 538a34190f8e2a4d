use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Periods of the independent polling tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Image marker scan period (ms).
    pub image_ms: u64,
    /// Meme shortcut scan period (ms).
    pub meme_ms: u64,
    /// URL linker scan period (ms).
    pub url_ms: u64,
    /// Time request scan period (ms).
    pub time_ms: u64,
    /// Move count poll period (ms).
    pub moves_ms: u64,
    /// Full dedup clear period (s).
    pub clear_interval_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            image_ms: defaults::IMAGE_SCAN_MS,
            meme_ms: defaults::MEME_SCAN_MS,
            url_ms: defaults::URL_SCAN_MS,
            time_ms: defaults::TIME_SCAN_MS,
            moves_ms: defaults::MOVE_POLL_MS,
            clear_interval_secs: defaults::DEDUP_CLEAR_SECS,
        }
    }
}

impl ScanConfig {
    /// Dedup clear period as a duration.
    pub fn clear_interval(&self) -> Duration {
        Duration::from_secs(self.clear_interval_secs)
    }
}

/// Limits and pacing for `!t!` requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeConfig {
    /// Requests above this many seconds are clamped.
    pub max_seconds: u64,
    /// Seconds granted per add-time invocation.
    pub increment: u64,
    /// Delay between add-time invocations (ms).
    pub click_delay_ms: u64,
    /// How long the applied/clamped highlight stays visible (ms).
    pub feedback_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            max_seconds: defaults::MAX_SECONDS,
            increment: defaults::TIME_INCREMENT,
            click_delay_ms: defaults::CLICK_DELAY_MS,
            feedback_ms: defaults::FEEDBACK_MS,
        }
    }
}

impl TimeConfig {
    /// Click spacing as a duration.
    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }

    /// Feedback lifetime as a duration.
    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }
}

/// Names the core needs from the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Class of the element holding chat messages.
    pub chat_container_class: String,
    /// `data-*` key marking an inlined image container.
    pub image_mark: String,
    /// `data-*` key marking a converted meme.
    pub meme_mark: String,
    /// `data-*` key marking a linked text container.
    pub url_mark: String,
    /// Durable key for dispatched time request identities.
    pub dedup_storage_key: String,
    /// Durable key for the mirrored style preferences.
    pub preferences_storage_key: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            chat_container_class: defaults::CHAT_CONTAINER_CLASS.to_string(),
            image_mark: defaults::IMAGE_MARK.to_string(),
            meme_mark: defaults::MEME_MARK.to_string(),
            url_mark: defaults::URL_MARK.to_string(),
            dedup_storage_key: defaults::DEDUP_STORAGE_KEY.to_string(),
            preferences_storage_key: defaults::PREFERENCES_STORAGE_KEY.to_string(),
        }
    }
}

/// Style catalogs and randomize behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Piece sets to sample from.
    pub piece_sets: Vec<String>,
    /// Board themes to sample from.
    pub board_themes: Vec<String>,
    /// Piece set assumed when the host reports none.
    pub default_piece_set: String,
    /// Board theme assumed when the host reports none.
    pub default_board_theme: String,
    /// Maximum retained history entries; oldest are dropped first.
    pub history_limit: usize,
    /// Pick a new style after each of our moves.
    pub randomize_on_my_move: bool,
    /// Pick a new style after each opponent move.
    pub randomize_on_opponent_move: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            piece_sets: defaults::PIECE_SETS.iter().map(|s| s.to_string()).collect(),
            board_themes: defaults::BOARD_THEMES.iter().map(|s| s.to_string()).collect(),
            default_piece_set: defaults::DEFAULT_PIECE_SET.to_string(),
            default_board_theme: defaults::DEFAULT_BOARD_THEME.to_string(),
            history_limit: defaults::HISTORY_LIMIT,
            randomize_on_my_move: false,
            randomize_on_opponent_move: false,
        }
    }
}

/// Meme id to image URL table.
pub(crate) fn default_memes() -> BTreeMap<String, String> {
    defaults::MEMES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
