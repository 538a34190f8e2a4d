//! Bare `http(s)://` URLs in free text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Command, Span};

/// Host-and-path shaped URL, matched leftmost-first so spans never overlap.
/// The boundary after the TLD is ASCII-only.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)https?://(?:www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}(?-u:\b)(?:[-a-zA-Z0-9()@:%_\+.~#?&/=]*)",
    )
    .expect("url pattern compiles")
});

/// True if `text` contains at least one linkable URL.
pub fn contains_url(text: &str) -> bool {
    URL_PATTERN.is_match(text)
}

/// All URL spans in `text`, ascending and non-overlapping.
pub fn url_spans(text: &str) -> Vec<Span> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| Span {
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Parse `text` into a [`Command::LinkUrls`], or `None` if it holds no URL.
pub fn parse_links(text: &str) -> Option<Command> {
    let spans = url_spans(text);
    if spans.is_empty() {
        return None;
    }
    Some(Command::LinkUrls { spans })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_each_url_once() {
        let text = "see https://lichess.org/abc and http://www.example.com/x?y=1 too";
        let spans = url_spans(text);
        let found: Vec<&str> = spans.iter().map(|s| s.slice(text)).collect();
        assert_eq!(
            found,
            vec!["https://lichess.org/abc", "http://www.example.com/x?y=1"]
        );
        assert!(spans.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn requires_scheme_and_tld() {
        assert!(parse_links("lichess.org").is_none());
        assert!(parse_links("ftp://example.com/file").is_none());
        assert!(parse_links("https://localhost").is_none());
        assert!(contains_url("HTTPS://EXAMPLE.COM"));
    }

    #[test]
    fn trailing_punctuation_outside_class_is_excluded() {
        let text = "(https://example.com/a!)";
        let spans = url_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slice(text), "https://example.com/a");
    }

    #[test]
    fn non_ascii_letter_ends_the_tld() {
        let text = "https://lichess.orgé";
        let spans = url_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slice(text), "https://lichess.org");
    }
}
