use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed chat marker, ready for dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Inline the image at `url` after the marker text.
    ShowImage {
        /// Validated image URL.
        url: String,
    },
    /// Rewrite meme shortcuts into image markers.
    ConvertMeme(MemeRewrite),
    /// Turn URL spans into links.
    LinkUrls {
        /// Non-overlapping spans in ascending order.
        spans: Vec<Span>,
    },
    /// Add time to a clock.
    AddTime(TimeRequest),
}

/// Result of rewriting `!meme!<id>` shortcuts in one text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeRewrite {
    /// Known meme ids that were replaced, lowercased, in order of appearance.
    pub meme_ids: Vec<String>,
    /// Full replacement text.
    pub text: String,
}

/// Byte range `[start, end)` of a match within the scanned text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl Span {
    /// The spanned slice of `text`.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Clock a time request is addressed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeTarget {
    /// `w`
    White,
    /// `b`
    Black,
    /// `bw` or `wb`
    Both,
    /// No token: legacy requests that always apply.
    Unspecified,
}

impl TimeTarget {
    /// Map the optional target token of a time marker.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "w" => Some(Self::White),
            "b" => Some(Self::Black),
            "bw" | "wb" => Some(Self::Both),
            "" => Some(Self::Unspecified),
            _ => None,
        }
    }
}

impl fmt::Display for TimeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Both => "both",
            Self::Unspecified => "unspecified",
        };
        f.write_str(s)
    }
}

/// A parsed `!t!` marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRequest {
    /// Addressed clock.
    pub target: TimeTarget,
    /// Seconds as written (saturating on overflow).
    pub requested: u64,
    /// Seconds after applying the configured maximum.
    pub clamped: u64,
}

impl TimeRequest {
    /// True if the maximum cut the request down.
    pub fn was_clamped(&self) -> bool {
        self.requested > self.clamped
    }

    /// Clamped seconds rounded up to a multiple of `increment`.
    pub fn applied_seconds(&self, increment: u64) -> u64 {
        round_up(self.clamped, increment)
    }

    /// Number of discrete add-time invocations needed for
    /// [`TimeRequest::applied_seconds`].
    pub fn increments(&self, increment: u64) -> u64 {
        if increment == 0 {
            return 0;
        }
        self.applied_seconds(increment) / increment
    }
}

/// Round `seconds` up to the next multiple of `increment`.
pub fn round_up(seconds: u64, increment: u64) -> u64 {
    if increment == 0 {
        return seconds;
    }
    seconds.div_ceil(increment).saturating_mul(increment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_follows_clamp_then_ceil() {
        let req = |requested: u64| TimeRequest {
            target: TimeTarget::Unspecified,
            requested,
            clamped: requested.min(300),
        };
        assert_eq!(req(90).applied_seconds(15), 90);
        assert_eq!(req(1).applied_seconds(15), 15);
        assert_eq!(req(16).applied_seconds(15), 30);
        assert_eq!(req(301).applied_seconds(15), 300);
        assert_eq!(req(500).increments(15), 20);
        assert!(req(301).was_clamped());
        assert!(!req(300).was_clamped());
    }

    #[test]
    fn applied_never_exceeds_rounded_maximum() {
        for s in 1..1000u64 {
            let r = TimeRequest {
                target: TimeTarget::Both,
                requested: s,
                clamped: s.min(300),
            };
            let applied = r.applied_seconds(15);
            assert_eq!(applied, round_up(s, 15).min(round_up(300, 15)));
            assert_eq!(applied % 15, 0);
        }
    }
}
