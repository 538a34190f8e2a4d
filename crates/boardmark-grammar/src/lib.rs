//! Pure parsers for the chat markers boardmark reacts to.
//!
//! Each feature has one function from raw text to an optional [`Command`]:
//! - [`parse_image`]: `!i!u|<url>` with an image path
//! - [`parse_meme`]: `!meme!<id>` rewritten through a [`MemeTable`]
//! - [`parse_links`]: bare `http(s)://` URLs
//! - [`parse_time`]: `!t![w|b|bw|wb]?[+]?<digits>`
//!
//! These formats are shared between clients and must not drift.

mod command;
mod image;
mod link;
mod meme;
mod time;

pub use command::{Command, MemeRewrite, Span, TimeRequest, TimeTarget, round_up};
pub use image::{IMAGE_EXTENSIONS, IMAGE_TAG, is_image_url, parse_image};
pub use link::{contains_url, parse_links, url_spans};
pub use meme::{MEME_TAG, MemeTable, parse_meme};
pub use time::{TIME_TAG, parse_time, parse_time_command};
