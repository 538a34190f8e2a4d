use std::sync::Arc;

use boardmark_doc::{Document, Dom, NodeKind, fixture};
use boardmark_engine::{
    Engine, Host, MemoryStore, Outcome, Pipeline, SkipReason,
    mock::{MockGameSignals, MockStyleSink, MockTimeControl},
};
use config::Config;
use parking_lot::Mutex;

/// A chat container holding one `<t>` message per entry.
fn chat(messages: &[&str]) -> Document {
    let items: Vec<String> = messages
        .iter()
        .map(|m| format!(r#"{{"tag":"li","children":[{{"tag":"t","children":[{m:?}]}}]}}"#))
        .collect();
    let json = format!(
        r#"{{"tag":"body","children":[{{"tag":"div","classes":["mchat__messages"],"children":[{}]}}]}}"#,
        items.join(",")
    );
    fixture::from_json(&json).expect("fixture")
}

fn engine(doc: Document) -> Engine<Document> {
    let host = Host::new(
        Arc::new(MockTimeControl::new()),
        Arc::new(MockGameSignals::new()),
        Arc::new(MockStyleSink::new()),
    );
    Engine::new(
        Arc::new(Mutex::new(doc)),
        Config::default(),
        host,
        Arc::new(MemoryStore::new()),
    )
}

fn count_tag(doc: &Document, tag: &str) -> usize {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|n| doc.element(*n).is_some_and(|e| e.tag == tag))
        .count()
}

#[test]
fn image_marker_is_inlined_once() {
    let marker = "!i!u|https://x.com/a.png";
    let e = engine(chat(&[marker]));

    let first = e.scan_once(Pipeline::Image);
    assert_eq!(first.dispatched, 1);
    let container = match first.outcomes.as_slice() {
        [Outcome::ImageInlined { container }] => *container,
        other => panic!("unexpected {other:?}"),
    };

    {
        let doc = e.document();
        let doc = doc.lock();
        assert_eq!(count_tag(&doc, "img"), 1);
        assert_eq!(doc.data(container, "imageInlined"), Some("true"));
        assert_eq!(doc.text_content(container), marker);
        let img = doc.children(container)[2];
        assert_eq!(
            doc.element(img).and_then(|el| el.attrs.get("src")).map(String::as_str),
            Some("https://x.com/a.png")
        );
        assert_eq!(doc.style(img, "max-width"), Some("200px"));
    }

    let second = e.scan_once(Pipeline::Image);
    assert_eq!(second.dispatched, 0);
    assert_eq!(
        second.outcomes,
        vec![Outcome::Skipped(SkipReason::AlreadyHandled)]
    );
    assert_eq!(count_tag(&e.document().lock(), "img"), 1);
}

#[test]
fn invalid_image_markers_are_ignored() {
    let e = engine(chat(&[
        "!i!u|https://x.com/a.txt",
        "!i!u|not a url.png",
        "look !i!u|https://x.com/a.png",
    ]));
    let report = e.scan_once(Pipeline::Image);
    assert_eq!((report.examined, report.unmatched, report.dispatched), (3, 3, 0));
    assert_eq!(count_tag(&e.document().lock(), "img"), 0);
}

#[test]
fn meme_becomes_image_marker_then_image() {
    let e = engine(chat(&["!meme!DOGE and !meme!unknown"]));
    let report = e.scan_all();
    assert!(report.outcomes.contains(&Outcome::MemeConverted {
        meme_ids: vec!["doge".into()]
    }));

    let doc = e.document();
    let doc = doc.lock();
    let text = doc.text_content(doc.root());
    assert!(text.starts_with("!i!u|https://upload.wikimedia.org/"));
    assert!(text.ends_with(" and !meme!unknown"));
    // The rewritten text carries more than a URL, so it is not a valid
    // image marker and stays as text.
    assert_eq!(count_tag(&doc, "img"), 0);
}

#[test]
fn lone_meme_is_inlined_in_the_same_pass() {
    let e = engine(chat(&["!meme!doge"]));
    let report = e.scan_all();
    assert_eq!(report.dispatched, 2);
    assert_eq!(count_tag(&e.document().lock(), "img"), 1);
    assert_eq!(e.scan_all().dispatched, 0);
}

#[test]
fn urls_are_linked_and_surrounding_text_kept() {
    let msg = "see https://lichess.org/abc and http://x.io/p?q=1 now";
    let e = engine(chat(&[msg]));
    let report = e.scan_once(Pipeline::Url);
    let container = match report.outcomes.as_slice() {
        [Outcome::Linked { container, links: 2 }] => *container,
        other => panic!("unexpected {other:?}"),
    };

    let doc = e.document();
    let doc = doc.lock();
    assert_eq!(doc.text_content(container), msg);
    let hrefs: Vec<String> = doc
        .children(container)
        .iter()
        .filter_map(|c| doc.element(*c))
        .filter_map(|el| el.attrs.get("href").cloned())
        .collect();
    assert_eq!(hrefs, vec!["https://lichess.org/abc", "http://x.io/p?q=1"]);
    let pieces: Vec<&str> = doc
        .children(container)
        .iter()
        .filter_map(|c| match doc.kind(*c) {
            Some(NodeKind::Text(t)) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(pieces, vec!["see ", " and ", " now"]);
}

#[test]
fn linked_text_is_not_relinked() {
    let e = engine(chat(&["https://lichess.org/abc"]));
    assert_eq!(e.scan_once(Pipeline::Url).dispatched, 1);
    let second = e.scan_once(Pipeline::Url);
    assert_eq!(second.dispatched, 0);
    assert_eq!(count_tag(&e.document().lock(), "a"), 1);
}

#[tokio::test(start_paused = true)]
async fn second_full_pass_changes_nothing() {
    let e = engine(chat(&[
        "!i!u|https://x.com/a.png",
        "!meme!doge",
        "read https://example.com/page",
        "!t!+90",
        "plain",
    ]));
    let first = e.scan_all();
    assert_eq!(first.failed, 0);
    assert!(first.dispatched >= 5);
    let after_first = {
        let doc = e.document();
        let doc = doc.lock();
        doc.outline(doc.root())
    };

    let second = e.scan_all();
    assert_eq!(second.dispatched, 0);
    assert_eq!(second.failed, 0);
    let after_second = {
        let doc = e.document();
        let doc = doc.lock();
        doc.outline(doc.root())
    };
    assert_eq!(after_first, after_second);
    e.shutdown().await;
}
