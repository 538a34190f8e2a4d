//! `!i!u|<url>` image markers.

use url::Url;

use crate::Command;

/// Literal prefix of an image marker.
pub const IMAGE_TAG: &str = "!i!u|";

/// Path suffixes accepted as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// True if `candidate` parses as a URL whose path ends in an image extension.
pub fn is_image_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(u) => {
            let path = u.path().to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        }
        Err(_) => false,
    }
}

/// Parse an image marker. The text must start with [`IMAGE_TAG`]; the
/// trimmed remainder must be an image URL.
pub fn parse_image(text: &str) -> Option<Command> {
    let url = text.strip_prefix(IMAGE_TAG)?.trim();
    is_image_url(url).then(|| Command::ShowImage {
        url: url.to_string(),
    })
}
