//! `!meme!<id>` shortcuts.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::{Command, MemeRewrite, image::IMAGE_TAG};

/// Literal prefix of a meme shortcut.
pub const MEME_TAG: &str = "!meme!";

/// `!meme!` followed by an ASCII word.
static MEME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!meme!([A-Za-z0-9_]+)").expect("meme pattern compiles"));

/// Case-insensitive meme id to image URL table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemeTable {
    /// Entries keyed by lowercased id.
    entries: BTreeMap<String, String>,
}

impl MemeTable {
    /// Build a table; ids are lowercased.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// URL for `id`, ignoring case.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(&id.to_lowercase()).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rewrite every known `!meme!<id>` in `text` into an image marker.
///
/// Unknown ids stay verbatim. Returns `None` when nothing was rewritten.
pub fn parse_meme(text: &str, table: &MemeTable) -> Option<Command> {
    if !text.contains(MEME_TAG) {
        return None;
    }
    let mut meme_ids = Vec::new();
    let rewritten = MEME_PATTERN.replace_all(text, |caps: &Captures<'_>| {
        let id = &caps[1];
        match table.get(id) {
            Some(url) => {
                meme_ids.push(id.to_lowercase());
                format!("{IMAGE_TAG}{url}")
            }
            None => caps[0].to_string(),
        }
    });
    if meme_ids.is_empty() {
        return None;
    }
    Some(Command::ConvertMeme(MemeRewrite {
        meme_ids,
        text: rewritten.into_owned(),
    }))
}
