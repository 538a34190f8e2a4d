use std::{sync::Arc, time::Duration};

use boardmark_doc::{Document, Dom, fixture};
use boardmark_engine::{
    Color, Engine, Host, MemoryStore, Outcome, Pipeline, SkipReason,
    mock::{MockGameSignals, MockStyleSink, MockTimeControl},
};
use config::Config;
use parking_lot::Mutex;
use tokio::time::{self, Instant};

const DEDUP_KEY: &str = "lichessTimeRequestsProcessed";

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

struct Rig {
    engine: Engine<Document>,
    control: MockTimeControl,
    signals: MockGameSignals,
}

fn rig(doc: Document, local: Option<Color>, store: &MemoryStore, config: Config) -> Rig {
    let control = MockTimeControl::new();
    let signals = MockGameSignals::with(0, local);
    let host = Host::new(
        Arc::new(control.clone()),
        Arc::new(signals.clone()),
        Arc::new(MockStyleSink::new()),
    );
    let engine = Engine::new(
        Arc::new(Mutex::new(doc)),
        config,
        host,
        Arc::new(store.clone()),
    );
    Rig {
        engine,
        control,
        signals,
    }
}

/// First `<t>` element under the root.
fn message(doc: &Document) -> boardmark_doc::NodeId {
    doc.descendants(doc.root())
        .into_iter()
        .find(|n| doc.element(*n).is_some_and(|e| e.tag == "t"))
        .expect("message element")
}

#[tokio::test(start_paused = true)]
async fn clamped_white_request_on_black_client() {
    let store = MemoryStore::new();
    let r = rig(chat(&["!t!w+500"]), Some(Color::Black), &store, Config::default());
    let t0 = Instant::now();

    let report = r.engine.scan_once(Pipeline::Time);
    assert_eq!(
        report.outcomes,
        vec![Outcome::TimeApplied {
            target: boardmark_grammar::TimeTarget::White,
            applied: 300,
            presses: 20,
            clamped: true,
        }]
    );

    {
        let doc = r.engine.document();
        let doc = doc.lock();
        let t = message(&doc);
        assert_eq!(doc.style(t, "color"), Some("orange"));
        assert_eq!(doc.text_content(t), "!t!w+500 (limited to 300s)");
    }

    assert!(r.engine.wait_idle(Duration::from_secs(10)).await);
    let offsets: Vec<u128> = r
        .control
        .click_times()
        .iter()
        .map(|t| t.duration_since(t0).as_millis())
        .collect();
    let expected: Vec<u128> = (1..=20).map(|i| i * 150).collect();
    assert_eq!(offsets, expected);

    let doc = r.engine.document();
    let doc = doc.lock();
    assert_eq!(doc.style(message(&doc), "color"), None);
}

#[tokio::test(start_paused = true)]
async fn feedback_restores_previous_colour_after_a_second() {
    let store = MemoryStore::new();
    let r = rig(chat(&["!t!+20"]), None, &store, Config::default());
    {
        let doc = r.engine.document();
        let mut doc = doc.lock();
        let t = message(&doc);
        doc.set_style(t, "color", Some("grey")).unwrap();
    }
    r.engine.scan_once(Pipeline::Time);
    let doc = r.engine.document();

    time::sleep(Duration::from_millis(999)).await;
    {
        let d = doc.lock();
        assert_eq!(d.style(message(&d), "color"), Some("green"));
    }
    time::sleep(Duration::from_millis(2)).await;
    let d = doc.lock();
    assert_eq!(d.style(message(&d), "color"), Some("grey"));
    assert_eq!(r.control.click_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn request_for_own_clock_is_recorded_but_not_applied() {
    let store = MemoryStore::new();
    let r = rig(chat(&["!t!w30"]), Some(Color::White), &store, Config::default());
    let report = r.engine.scan_once(Pipeline::Time);
    assert_eq!(report.outcomes, vec![Outcome::Skipped(SkipReason::NotForUs)]);
    assert_eq!(r.engine.dedup_len(), 1);
    time::sleep(Duration::from_secs(2)).await;
    assert_eq!(r.control.click_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unknown_colour_defers_until_detected() {
    let store = MemoryStore::new();
    let r = rig(chat(&["!t!b45"]), None, &store, Config::default());
    let first = r.engine.scan_once(Pipeline::Time);
    assert_eq!(first.outcomes, vec![Outcome::Skipped(SkipReason::ColorUnknown)]);
    assert_eq!(r.engine.dedup_len(), 0);

    r.signals.set_local_color(Some(Color::White));
    let second = r.engine.scan_once(Pipeline::Time);
    assert!(matches!(
        second.outcomes.as_slice(),
        [Outcome::TimeApplied { applied: 45, presses: 3, clamped: false, .. }]
    ));
    assert!(r.engine.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(r.control.click_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn identical_messages_are_separate_requests() {
    let store = MemoryStore::new();
    let r = rig(chat(&["!t!+15", "!t!+15"]), None, &store, Config::default());
    assert_eq!(r.engine.scan_once(Pipeline::Time).dispatched, 2);
    assert_eq!(r.engine.scan_once(Pipeline::Time).dispatched, 0);
    assert!(r.engine.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(r.control.click_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn dispatched_requests_survive_reload() {
    let store = MemoryStore::new();
    let first = rig(chat(&["hi", "!t!+60"]), None, &store, Config::default());
    assert_eq!(first.engine.scan_once(Pipeline::Time).dispatched, 1);
    assert!(first.engine.wait_idle(Duration::from_secs(5)).await);
    assert_eq!(first.control.click_count(), 4);
    assert!(store.raw(DEDUP_KEY).is_some_and(|raw| raw.contains("!t!+60:")));

    // A reload rebuilds everything over the same storage and page.
    let second = rig(chat(&["hi", "!t!+60"]), None, &store, Config::default());
    let report = second.engine.scan_once(Pipeline::Time);
    assert_eq!(report.outcomes, vec![Outcome::Skipped(SkipReason::Duplicate)]);
    time::sleep(Duration::from_secs(5)).await;
    assert_eq!(second.control.click_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn hourly_clear_allows_reprocessing() {
    let store = MemoryStore::new();
    let mut config = Config::default();
    // Keep the periodic time scan out of the way; passes are driven here.
    config.scan.time_ms = 24 * 3600 * 1000;
    let r = rig(chat(&["!t!+15"]), None, &store, config);
    r.engine.start();

    assert_eq!(r.engine.scan_once(Pipeline::Time).dispatched, 1);
    assert_eq!(r.engine.dedup_len(), 1);

    time::sleep(Duration::from_secs(3599)).await;
    assert_eq!(r.engine.dedup_len(), 1);
    time::sleep(Duration::from_secs(2)).await;
    assert_eq!(r.engine.dedup_len(), 0);
    assert_eq!(store.raw(DEDUP_KEY).as_deref(), Some("[]"));

    // Still visible after the clear, so it fires again.
    assert_eq!(r.engine.scan_once(Pipeline::Time).dispatched, 1);
    r.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn missing_control_consumes_the_request() {
    let store = MemoryStore::new();
    let r = rig(chat(&["!t!+30"]), None, &store, Config::default());
    r.control.set_available(false);
    let report = r.engine.scan_once(Pipeline::Time);
    assert_eq!(report.outcomes, vec![Outcome::Skipped(SkipReason::NoTimeControl)]);
    assert_eq!(r.engine.dedup_len(), 1);

    r.control.set_available(true);
    assert_eq!(r.engine.scan_once(Pipeline::Time).dispatched, 0);
}

#[tokio::test(start_paused = true)]
async fn requests_outside_chat_and_storage_failures() {
    let doc = fixture::from_json(
        r#"{"tag":"body","children":[
            {"tag":"p","children":["!t!+30"]},
            {"tag":"div","classes":["mchat__messages"],"children":[
                {"tag":"li","children":[{"tag":"t","children":["!t!+30"]}]}
            ]}
        ]}"#,
    )
    .unwrap();
    let store = MemoryStore::new();
    store.set_fail_writes(true);
    let r = rig(doc, None, &store, Config::default());
    let report = r.engine.scan_once(Pipeline::Time);
    assert_eq!(report.failed, 0);
    assert_eq!(report.outcomes[0], Outcome::Skipped(SkipReason::NoIdentity));
    assert!(report.outcomes[1].is_dispatched());
    // Memory stays authoritative when writes fail.
    assert_eq!(r.engine.scan_once(Pipeline::Time).dispatched, 0);
    assert_eq!(store.raw(DEDUP_KEY), None);
}
