//! Host adapters that read and write the fixture document, using the
//! lichess page conventions.

use std::sync::Arc;

use boardmark_doc::{Document, Dom, NodeId};
use boardmark_engine::{
    Color, Error, GameSignals, Host, Result, StyleSink, StyleSnapshot, TimeControl,
};
use parking_lot::Mutex;
use tracing::info;

/// Tag of one ply in the move list.
const MOVE_TAG: &str = "kwdb";
/// Tag of the move list container.
const MOVE_LIST_TAG: &str = "l4x";
/// Class of the board wrapper carrying the orientation.
const BOARD_WRAP_CLASS: &str = "cg-wrap";
/// Class of a clock.
const CLOCK_CLASS: &str = "rclock";
/// Class of the add-time control.
const MORETIME_CLASS: &str = "moretime";
/// Id of the piece stylesheet link.
const PIECE_SPRITE_ID: &str = "piece-sprite";
/// Asset host used when the page does not name one.
const DEFAULT_ASSET_URL: &str = "https://lichess1.org";

/// All three adapters over one shared document.
pub fn document_host(doc: &Arc<Mutex<Document>>, local_override: Option<Color>) -> Host {
    Host::new(
        Arc::new(DocTimeControl {
            doc: Arc::clone(doc),
        }),
        Arc::new(DocSignals {
            doc: Arc::clone(doc),
            local_override,
        }),
        Arc::new(DocStyleSink {
            doc: Arc::clone(doc),
        }),
    )
}

/// First element under the root matching `pred`, in document order.
fn find(doc: &Document, pred: impl Fn(&Document, NodeId) -> bool) -> Option<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .find(|n| pred(doc, *n))
}

/// True if `node` is an element with every class in `classes`.
fn has_classes(doc: &Document, node: NodeId, classes: &[&str]) -> bool {
    doc.element(node)
        .is_some_and(|e| classes.iter().all(|c| e.has_class(c)))
}

/// True if `node` is a `tag` element.
fn is_tag(doc: &Document, node: NodeId, tag: &str) -> bool {
    doc.element(node).is_some_and(|e| e.tag == tag)
}

/// Move count, orientation and running clock.
struct DocSignals {
    /// Page.
    doc: Arc<Mutex<Document>>,
    /// Colour forced from the command line.
    local_override: Option<Color>,
}

impl GameSignals for DocSignals {
    fn move_count(&self) -> Option<u32> {
        let doc = self.doc.lock();
        let moves = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|n| is_tag(&doc, *n, MOVE_TAG))
            .count();
        if moves == 0 && find(&doc, |d, n| is_tag(d, n, MOVE_LIST_TAG)).is_none() {
            return None;
        }
        u32::try_from(moves).ok()
    }

    fn local_color(&self) -> Option<Color> {
        if self.local_override.is_some() {
            return self.local_override;
        }
        let doc = self.doc.lock();
        let wrap = find(&doc, |d, n| has_classes(d, n, &[BOARD_WRAP_CLASS]))?;
        if has_classes(&doc, wrap, &["orientation-white"]) {
            Some(Color::White)
        } else if has_classes(&doc, wrap, &["orientation-black"]) {
            Some(Color::Black)
        } else {
            None
        }
    }

    fn side_to_move(&self) -> Option<Color> {
        let doc = self.doc.lock();
        if find(&doc, |d, n| has_classes(d, n, &[CLOCK_CLASS, "rclock-white", "running"])).is_some()
        {
            Some(Color::White)
        } else if find(&doc, |d, n| has_classes(d, n, &[CLOCK_CLASS, "rclock-black", "running"]))
            .is_some()
        {
            Some(Color::Black)
        } else {
            None
        }
    }
}

/// The `a.moretime` control. Presses are counted in its `data-presses`.
struct DocTimeControl {
    /// Page.
    doc: Arc<Mutex<Document>>,
}

impl DocTimeControl {
    /// The control, if present.
    fn control(doc: &Document) -> Option<NodeId> {
        find(doc, |d, n| is_tag(d, n, "a") && has_classes(d, n, &[MORETIME_CLASS]))
    }
}

impl TimeControl for DocTimeControl {
    fn is_available(&self) -> bool {
        Self::control(&self.doc.lock()).is_some()
    }

    fn add_time(&self) -> Result<()> {
        let mut doc = self.doc.lock();
        let control = Self::control(&doc)
            .ok_or_else(|| Error::MissingHostElement("a.moretime".into()))?;
        let presses = doc
            .data(control, "presses")
            .and_then(|p| p.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        doc.set_data(control, "presses", &presses.to_string())?;
        info!(presses, "pressed add-time control");
        Ok(())
    }
}

/// Board style on the root's `data-piece-set` / `data-board`.
struct DocStyleSink {
    /// Page.
    doc: Arc<Mutex<Document>>,
}

impl StyleSink for DocStyleSink {
    fn apply(&self, style: &StyleSnapshot) -> Result<()> {
        let mut doc = self.doc.lock();
        let root = doc.root();
        let asset = doc
            .data(root, "assetUrl")
            .unwrap_or(DEFAULT_ASSET_URL)
            .to_string();
        if let Some(sprite) = find(&doc, |d, n| {
            d.element(n)
                .is_some_and(|e| e.attrs.get("id").is_some_and(|id| id == PIECE_SPRITE_ID))
        }) {
            let href = format!("{asset}/assets/piece-css/{}.css", style.piece_set);
            doc.set_attr(sprite, "href", &href)?;
        }
        doc.set_data(root, "pieceSet", &style.piece_set)?;
        doc.set_data(root, "board", &style.board_theme)?;
        Ok(())
    }

    fn current_piece_set(&self) -> Option<String> {
        let doc = self.doc.lock();
        doc.data(doc.root(), "pieceSet").map(str::to_string)
    }

    fn current_board_theme(&self) -> Option<String> {
        let doc = self.doc.lock();
        doc.data(doc.root(), "board").map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use boardmark_doc::fixture;

    use super::*;

    fn page() -> Arc<Mutex<Document>> {
        let doc = fixture::from_json(
            r#"{"tag":"body","data":{"pieceSet":"merida"},"children":[
                {"tag":"div","classes":["cg-wrap","orientation-black"]},
                {"tag":"div","classes":["rclock","rclock-white","running"]},
                {"tag":"l4x","children":[{"tag":"kwdb"},{"tag":"kwdb"},{"tag":"kwdb"}]},
                {"tag":"a","classes":["moretime"]},
                {"tag":"link","attrs":{"id":"piece-sprite"}}
            ]}"#,
        )
        .unwrap();
        Arc::new(Mutex::new(doc))
    }

    #[test]
    fn reads_lichess_signals() {
        let doc = page();
        let host = document_host(&doc, None);
        assert_eq!(host.signals.move_count(), Some(3));
        assert_eq!(host.signals.local_color(), Some(Color::Black));
        assert_eq!(host.signals.side_to_move(), Some(Color::White));
        assert_eq!(
            document_host(&doc, Some(Color::White)).signals.local_color(),
            Some(Color::White)
        );
        assert_eq!(host.style.current_piece_set().as_deref(), Some("merida"));
        assert_eq!(host.style.current_board_theme(), None);
    }

    #[test]
    fn presses_and_styles_land_in_the_document() {
        let doc = page();
        let host = document_host(&doc, None);
        assert!(host.time.is_available());
        host.time.add_time().unwrap();
        host.time.add_time().unwrap();
        host.style
            .apply(&StyleSnapshot::new("alpha", "blue"))
            .unwrap();

        let d = doc.lock();
        let control = DocTimeControl::control(&d).unwrap();
        assert_eq!(d.data(control, "presses"), Some("2"));
        assert_eq!(d.data(d.root(), "board"), Some("blue"));
        let sprite = find(&d, |dd, n| is_tag(dd, n, "link")).unwrap();
        assert_eq!(
            d.element(sprite).and_then(|e| e.attrs.get("href")).map(String::as_str),
            Some("https://lichess1.org/assets/piece-css/alpha.css")
        );
    }

    #[test]
    fn missing_move_list_is_no_signal() {
        let doc = Arc::new(Mutex::new(Document::default()));
        let host = document_host(&doc, None);
        assert_eq!(host.signals.move_count(), None);
        assert!(!host.time.is_available());
        assert!(host.time.add_time().is_err());
    }
}
