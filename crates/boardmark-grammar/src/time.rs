//! `!t!` time requests.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Command, TimeRequest, TimeTarget};

/// Literal prefix of a time marker.
pub const TIME_TAG: &str = "!t!";

/// Body after the tag: optional target, optional plus, digits.
static TIME_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(bw|wb|w|b)?\+?([0-9]+)$").expect("time pattern compiles"));

/// Parse a time marker, clamping to `max_seconds`.
///
/// The text must start with [`TIME_TAG`]; the trimmed remainder must be the
/// whole body. Zero seconds is not a request.
pub fn parse_time(text: &str, max_seconds: u64) -> Option<TimeRequest> {
    let body = text.strip_prefix(TIME_TAG)?.trim();
    let caps = TIME_BODY.captures(body)?;
    let target = TimeTarget::from_token(caps.get(1).map_or("", |m| m.as_str()))?;
    // Only overflow can fail here: the pattern guarantees digits.
    let requested = caps[2].parse::<u64>().unwrap_or(u64::MAX);
    if requested == 0 {
        return None;
    }
    Some(TimeRequest {
        target,
        requested,
        clamped: requested.min(max_seconds),
    })
}

/// [`parse_time`] wrapped as a [`Command`].
pub fn parse_time_command(text: &str, max_seconds: u64) -> Option<Command> {
    parse_time(text, max_seconds).map(Command::AddTime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_tokens() {
        let t = |s: &str| parse_time(s, 300).map(|r| r.target);
        assert_eq!(t("!t!w+30"), Some(TimeTarget::White));
        assert_eq!(t("!t!b30"), Some(TimeTarget::Black));
        assert_eq!(t("!t!bw+15"), Some(TimeTarget::Both));
        assert_eq!(t("!t!wb15"), Some(TimeTarget::Both));
        assert_eq!(t("!t!+90"), Some(TimeTarget::Unspecified));
        assert_eq!(t("!t!90"), Some(TimeTarget::Unspecified));
        assert_eq!(t("!t!x90"), None);
        assert_eq!(t("!t!W90"), None);
    }

    #[test]
    fn clamps_and_keeps_requested() {
        let r = parse_time("!t!w+500", 300).unwrap();
        assert_eq!((r.requested, r.clamped), (500, 300));
        assert!(r.was_clamped());
        assert_eq!(r.increments(15), 20);
        let huge = parse_time("!t!99999999999999999999999", 300).unwrap();
        assert_eq!(huge.clamped, 300);
    }

    #[test]
    fn rejects_malformed_bodies() {
        for bad in ["!t!", "!t!+", "!t!0", "!t!+0", "!t!-5", "!t!1.5", "!t!+90s", " !t!+90", "t!+90"] {
            assert!(parse_time(bad, 300).is_none(), "{bad}");
        }
        assert!(parse_time("!t! +90 ", 300).is_some());
    }
}
