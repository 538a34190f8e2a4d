//! Bounded linear undo/redo over applied board styles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An applied piece set and board theme.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleSnapshot {
    /// Piece sprite set, e.g. `cburnett`.
    pub piece_set: String,
    /// Board theme, e.g. `brown`.
    pub board_theme: String,
}

impl StyleSnapshot {
    /// Build a snapshot.
    pub fn new(piece_set: impl Into<String>, board_theme: impl Into<String>) -> Self {
        Self {
            piece_set: piece_set.into(),
            board_theme: board_theme.into(),
        }
    }
}

impl fmt::Display for StyleSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.piece_set, self.board_theme)
    }
}

/// Style history with a cursor.
///
/// `cursor` is `None` only before the first push; afterwards it always
/// indexes a valid entry. Pushing after moving back truncates the forward
/// branch. When more than `limit` entries would be kept, the oldest is
/// dropped.
#[derive(Clone, Debug)]
pub struct StyleHistory {
    /// Applied styles, oldest first.
    entries: Vec<StyleSnapshot>,
    /// Index of the current entry.
    cursor: Option<usize>,
    /// Maximum retained entries (at least one).
    limit: usize,
}

impl StyleHistory {
    /// Empty history keeping at most `limit` entries.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            limit: limit.max(1),
        }
    }

    /// Record a newly applied style and make it current.
    pub fn push(&mut self, snapshot: StyleSnapshot) {
        if let Some(c) = self.cursor {
            self.entries.truncate(c + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back; `None` (and no change) at the oldest entry.
    pub fn back(&mut self) -> Option<&StyleSnapshot> {
        let c = self.cursor.filter(|c| *c > 0)?;
        self.cursor = Some(c - 1);
        self.entries.get(c - 1)
    }

    /// Step forward; `None` (and no change) at the newest entry.
    pub fn forward(&mut self) -> Option<&StyleSnapshot> {
        let c = self.cursor.filter(|c| c + 1 < self.entries.len())?;
        self.cursor = Some(c + 1);
        self.entries.get(c + 1)
    }

    /// True if [`Self::back`] would move.
    pub fn can_back(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// True if [`Self::forward`] would move.
    pub fn can_forward(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Entry at the cursor.
    pub fn current(&self) -> Option<&StyleSnapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Cursor position, `None` before the first push.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before the first push.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
