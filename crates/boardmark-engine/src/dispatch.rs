//! Side effects for parsed chat markers.
//!
//! Image, meme and link dispatch mutate the document and leave a handled
//! mark behind, so a second pass over the same text is a no-op without any
//! dedup bookkeeping. Time requests press an external control, so they go
//! through the [`DedupStore`] instead: the identity is admitted before the
//! first press is scheduled.

use std::{result::Result as StdResult, sync::Arc};

use boardmark_doc::{Dom, GENERATED_MARK, Identity, NodeId, TextOccurrence};
use boardmark_grammar::{Command, MemeRewrite, Span, TimeRequest, TimeTarget};
use config::{HostConfig, TimeConfig};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    Result,
    clicks::start_clicks,
    dedup::DedupStore,
    host::{Color, Host},
    ticker::Ticker,
};

/// Ticker id prefix for pending feedback reverts.
pub const FEEDBACK_PREFIX: &str = "feedback:";

/// Colour shown on a request applied as written.
const APPLIED_COLOR: &str = "green";
/// Colour shown on a request cut down to the maximum.
const CLAMPED_COLOR: &str = "orange";
/// Link colour.
const LINK_COLOR: &str = "#2196F3";

/// Why a parsed command had no effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The text sits under an element already carrying the handled mark.
    AlreadyHandled,
    /// The identity was dispatched since the last dedup clear.
    Duplicate,
    /// The text is outside any chat container.
    NoIdentity,
    /// The request addresses the local player's own clock.
    NotForUs,
    /// The request is colour-specific and the local colour is unknown.
    ColorUnknown,
    /// The add-time control is missing.
    NoTimeControl,
    /// The node left the document since the snapshot.
    Detached,
    /// The node's text changed since the snapshot.
    Stale,
}

/// Result of dispatching one command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// An image was inlined.
    ImageInlined {
        /// The new container holding the text and the image.
        container: NodeId,
    },
    /// Meme shortcuts were rewritten to image markers.
    MemeConverted {
        /// Ids that were rewritten.
        meme_ids: Vec<String>,
    },
    /// URLs became links.
    Linked {
        /// The new container holding text and links.
        container: NodeId,
        /// Number of links created.
        links: usize,
    },
    /// Add-time presses were scheduled.
    TimeApplied {
        /// Addressed clock.
        target: TimeTarget,
        /// Seconds that will be added.
        applied: u64,
        /// Presses scheduled.
        presses: u64,
        /// True if the request exceeded the maximum.
        clamped: bool,
    },
    /// Nothing happened.
    Skipped(SkipReason),
}

impl Outcome {
    /// True unless the command was skipped.
    pub fn is_dispatched(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Decide whether a time request applies on this client.
///
/// Each client reads the request independently; a colour-specific request is
/// acted on by the opponent of the named side, who owns the add-time control
/// for that clock.
pub fn route_time(target: TimeTarget, local: Option<Color>) -> StdResult<(), SkipReason> {
    let wanted = match target {
        TimeTarget::Both | TimeTarget::Unspecified => return Ok(()),
        TimeTarget::White => Color::Black,
        TimeTarget::Black => Color::White,
    };
    match local {
        None => Err(SkipReason::ColorUnknown),
        Some(c) if c == wanted => Ok(()),
        Some(_) => Err(SkipReason::NotForUs),
    }
}

/// Host state read once per pass, before the document is locked.
///
/// Adapters may read the same document the scanner holds, so they are never
/// called while a pass has it locked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostProbe {
    /// Local side, if conclusive.
    pub local_color: Option<Color>,
    /// Whether the add-time control is present.
    pub time_available: bool,
}

/// Executes commands against a document and the host adapters.
pub struct Dispatcher<D> {
    /// Shared handle, used by deferred feedback reverts.
    doc: Arc<Mutex<D>>,
    /// Host adapters.
    host: Host,
    /// Scheduler for presses and feedback.
    ticker: Ticker,
    /// Time request dedup set.
    dedup: Arc<Mutex<DedupStore>>,
    /// Handled-mark names.
    marks: HostConfig,
    /// Time limits and pacing.
    time: TimeConfig,
}

impl<D: Dom + 'static> Dispatcher<D> {
    /// Build a dispatcher. `doc` must be the same document later passed to
    /// [`Self::dispatch`].
    pub fn new(
        doc: Arc<Mutex<D>>,
        host: Host,
        ticker: Ticker,
        dedup: Arc<Mutex<DedupStore>>,
        marks: HostConfig,
        time: TimeConfig,
    ) -> Self {
        Self {
            doc,
            host,
            ticker,
            dedup,
            marks,
            time,
        }
    }

    /// Read the host state a pass needs. Call without the document locked.
    pub fn probe(&self) -> HostProbe {
        HostProbe {
            local_color: self.host.signals.local_color(),
            time_available: self.host.time.is_available(),
        }
    }

    /// Execute `cmd` for `occ` on the locked document.
    ///
    /// Time requests schedule work on the tokio runtime.
    pub fn dispatch(
        &self,
        doc: &mut D,
        occ: &TextOccurrence,
        cmd: Command,
        probe: &HostProbe,
    ) -> Result<Outcome> {
        if !doc.is_attached(occ.node) || doc.parent(occ.node).is_none() {
            return Ok(Outcome::Skipped(SkipReason::Detached));
        }
        if doc.text(occ.node) != Some(occ.text.as_str()) {
            return Ok(Outcome::Skipped(SkipReason::Stale));
        }
        match cmd {
            Command::ShowImage { url } => self.inline_image(doc, occ.node, &url),
            Command::ConvertMeme(rewrite) => self.convert_meme(doc, occ.node, rewrite),
            Command::LinkUrls { spans } => self.link_urls(doc, occ.node, &occ.text, &spans),
            Command::AddTime(req) => self.add_time(doc, occ, req, probe),
        }
    }

    /// Allocate an element that identity numbering ignores.
    fn generated(doc: &mut D, tag: &str) -> Result<NodeId> {
        let el = doc.create_element(tag);
        doc.set_data(el, GENERATED_MARK, "true")?;
        Ok(el)
    }

    /// Replace the text with a container holding the text, a break and the
    /// image.
    fn inline_image(&self, doc: &mut D, node: NodeId, url: &str) -> Result<Outcome> {
        if doc.is_handled(node, &self.marks.image_mark) {
            return Ok(Outcome::Skipped(SkipReason::AlreadyHandled));
        }
        let container = Self::generated(doc, "div")?;
        doc.replace_with(node, container)?;
        doc.append_child(container, node)?;
        let br = Self::generated(doc, "br")?;
        doc.append_child(container, br)?;

        let img = Self::generated(doc, "img")?;
        doc.set_attr(img, "src", url)?;
        doc.set_data(img, "openUrl", url)?;
        for (prop, value) in [
            ("max-width", "200px"),
            ("max-height", "200px"),
            ("border", "1px solid #666"),
            ("border-radius", "4px"),
            ("margin", "4px 0"),
            ("cursor", "pointer"),
        ] {
            doc.set_style(img, prop, Some(value))?;
        }
        doc.append_child(container, img)?;
        doc.set_data(container, &self.marks.image_mark, "true")?;
        info!(target: "boardmark::image", url, "inlined image");
        Ok(Outcome::ImageInlined { container })
    }

    /// Rewrite the text in place and mark its parent.
    fn convert_meme(&self, doc: &mut D, node: NodeId, rewrite: MemeRewrite) -> Result<Outcome> {
        if doc.is_handled(node, &self.marks.meme_mark) {
            return Ok(Outcome::Skipped(SkipReason::AlreadyHandled));
        }
        let Some(parent) = doc.parent(node) else {
            return Ok(Outcome::Skipped(SkipReason::Detached));
        };
        doc.set_text(node, &rewrite.text)?;
        doc.set_data(parent, &self.marks.meme_mark, "true")?;
        info!(target: "boardmark::meme", ids = ?rewrite.meme_ids, "converted meme shortcut");
        Ok(Outcome::MemeConverted {
            meme_ids: rewrite.meme_ids,
        })
    }

    /// Replace the text with a span of plain text pieces and links.
    fn link_urls(&self, doc: &mut D, node: NodeId, text: &str, spans: &[Span]) -> Result<Outcome> {
        // Image markers are left for the image inliner, which also keeps its
        // own text out of the linker's reach.
        if doc.is_handled(node, &self.marks.url_mark) || doc.is_handled(node, &self.marks.image_mark)
        {
            return Ok(Outcome::Skipped(SkipReason::AlreadyHandled));
        }
        let container = Self::generated(doc, "span")?;
        let mut last = 0;
        for span in spans {
            if span.start > last {
                let piece = doc.create_text(&text[last..span.start]);
                doc.append_child(container, piece)?;
            }
            let url = span.slice(text);
            let link = Self::generated(doc, "a")?;
            doc.set_attr(link, "href", url)?;
            doc.set_attr(link, "target", "_blank")?;
            doc.set_attr(link, "rel", "noopener noreferrer")?;
            doc.set_style(link, "color", Some(LINK_COLOR))?;
            doc.set_style(link, "text-decoration", Some("underline"))?;
            doc.set_style(link, "word-break", Some("break-all"))?;
            let label = doc.create_text(url);
            doc.append_child(link, label)?;
            doc.append_child(container, link)?;
            last = span.end;
        }
        if last < text.len() {
            let rest = doc.create_text(&text[last..]);
            doc.append_child(container, rest)?;
        }
        doc.set_data(container, &self.marks.url_mark, "true")?;
        doc.replace_with(node, container)?;
        info!(target: "boardmark::url", links = spans.len(), "linked urls");
        Ok(Outcome::Linked {
            container,
            links: spans.len(),
        })
    }

    /// Route, admit, schedule presses, then show feedback.
    fn add_time(
        &self,
        doc: &mut D,
        occ: &TextOccurrence,
        req: TimeRequest,
        probe: &HostProbe,
    ) -> Result<Outcome> {
        let Some(id) = occ.identity.as_ref() else {
            return Ok(Outcome::Skipped(SkipReason::NoIdentity));
        };
        if !self.dedup.lock().is_new(id) {
            debug!(target: "boardmark::time", identity = %id, "already processed");
            return Ok(Outcome::Skipped(SkipReason::Duplicate));
        }
        let Some(parent) = occ.parent.filter(|p| doc.parent(occ.node) == Some(*p)) else {
            return Ok(Outcome::Skipped(SkipReason::Detached));
        };

        match route_time(req.target, probe.local_color) {
            Ok(()) => {}
            Err(SkipReason::ColorUnknown) => {
                // Not recorded: a later pass may know our colour.
                debug!(target: "boardmark::time", identity = %id, clock = %req.target, "colour unknown; deferring");
                return Ok(Outcome::Skipped(SkipReason::ColorUnknown));
            }
            Err(reason) => {
                self.dedup.lock().mark_dispatched(id);
                debug!(target: "boardmark::time", identity = %id, clock = %req.target, "request is for the other client");
                return Ok(Outcome::Skipped(reason));
            }
        }

        // Admission precedes the first press so overlapping passes cannot
        // start a second sequence for the same message.
        if !self.dedup.lock().admit(id) {
            return Ok(Outcome::Skipped(SkipReason::Duplicate));
        }
        if !probe.time_available {
            warn!(target: "boardmark::time", identity = %id, "no add-time control on page");
            return Ok(Outcome::Skipped(SkipReason::NoTimeControl));
        }

        let applied = req.applied_seconds(self.time.increment);
        let presses = req.increments(self.time.increment);
        start_clicks(
            &self.ticker,
            Arc::clone(&self.host.time),
            id,
            presses,
            self.time.click_delay(),
        );
        self.show_feedback(doc, parent, id, req.was_clamped(), applied)?;
        info!(
            target: "boardmark::time",
            identity = %id,
            requested = req.requested,
            applied,
            presses,
            "adding time"
        );
        Ok(Outcome::TimeApplied {
            target: req.target,
            applied,
            presses,
            clamped: req.was_clamped(),
        })
    }

    /// Colour the message and schedule the revert.
    fn show_feedback(
        &self,
        doc: &mut D,
        parent: NodeId,
        id: &Identity,
        clamped: bool,
        applied: u64,
    ) -> Result<()> {
        let original = doc.style(parent, "color").map(str::to_string);
        let color = if clamped { CLAMPED_COLOR } else { APPLIED_COLOR };
        doc.set_style(parent, "color", Some(color))?;
        if clamped {
            let note = Self::generated(doc, "span")?;
            let label = doc.create_text(&format!(" (limited to {applied}s)"));
            doc.append_child(note, label)?;
            doc.set_style(note, "color", Some(CLAMPED_COLOR))?;
            doc.set_style(note, "font-size", Some("0.8em"))?;
            doc.append_child(parent, note)?;
        }

        let shared = Arc::clone(&self.doc);
        self.ticker.after(
            format!("{FEEDBACK_PREFIX}{id}"),
            self.time.feedback(),
            move || {
                let mut doc = shared.lock();
                if !doc.is_attached(parent) {
                    return;
                }
                if let Err(e) = doc.set_style(parent, "color", original.as_deref()) {
                    warn!(target: "boardmark::time", error = %e, "failed to restore message colour");
                }
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_table() {
        use TimeTarget::*;
        assert_eq!(route_time(White, Some(Color::Black)), Ok(()));
        assert_eq!(route_time(White, Some(Color::White)), Err(SkipReason::NotForUs));
        assert_eq!(route_time(Black, Some(Color::White)), Ok(()));
        assert_eq!(route_time(Black, Some(Color::Black)), Err(SkipReason::NotForUs));
        assert_eq!(route_time(Black, None), Err(SkipReason::ColorUnknown));
        for local in [None, Some(Color::White), Some(Color::Black)] {
            assert_eq!(route_time(Both, local), Ok(()));
            assert_eq!(route_time(Unspecified, local), Ok(()));
        }
    }
}
