use std::{env, fs, path::PathBuf, process};

use crate::{Config, Error, load_from_path, load_from_str};

fn temp_path(name: &str) -> PathBuf {
    let mut p = env::temp_dir();
    p.push(format!("boardmark-config-{}-{}", process::id(), name));
    p
}

#[test]
fn empty_source_yields_defaults() {
    let cfg = load_from_str("()").unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.time.max_seconds, 300);
    assert_eq!(cfg.time.increment, 15);
    assert_eq!(cfg.time.click_delay_ms, 150);
    assert_eq!(cfg.scan.clear_interval_secs, 3600);
    assert_eq!(cfg.style.piece_sets.len(), 22);
    assert_eq!(cfg.style.board_themes.len(), 25);
    assert!(cfg.memes.contains_key("doge"));
}

#[test]
fn partial_sections_merge_with_defaults() {
    let cfg = load_from_str(
        r#"(
            time: (max_seconds: 120),
            style: (randomize_on_my_move: true),
            memes: {"cat": "https://x.example/cat.png"},
        )"#,
    )
    .unwrap();
    assert_eq!(cfg.time.max_seconds, 120);
    assert_eq!(cfg.time.increment, 15);
    assert!(cfg.style.randomize_on_my_move);
    assert!(!cfg.style.randomize_on_opponent_move);
    assert_eq!(cfg.memes.len(), 1);
}

#[test]
fn unknown_fields_are_parse_errors() {
    let err = load_from_str("(time: (max_secs: 10))").unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "{err:?}");
}

#[test]
fn zero_increment_fails_validation() {
    let err = load_from_str("(time: (increment: 0))").unwrap_err();
    match err {
        Error::Validation { field, .. } => assert_eq!(field, "time.increment"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn empty_catalog_fails_validation() {
    let err = load_from_str("(style: (piece_sets: []))").unwrap_err();
    assert!(err.pretty().contains("style.piece_sets"));
}

#[test]
fn load_from_path_attaches_path_and_checks_extension() {
    let bad_ext = temp_path("cfg.toml");
    let err = load_from_path(&bad_ext).unwrap_err();
    assert_eq!(err.path(), Some(bad_ext.as_path()));

    let p = temp_path("cfg.ron");
    fs::write(&p, "(scan: (moves_ms: 0))").unwrap();
    let err = load_from_path(&p).unwrap_err();
    assert_eq!(err.path(), Some(p.as_path()));
    assert!(err.pretty().contains("scan.moves_ms"));

    fs::write(&p, "(scan: (moves_ms: 250))").unwrap();
    let cfg = load_from_path(&p).unwrap();
    assert_eq!(cfg.scan.moves_ms, 250);
    let _ignored = fs::remove_file(&p);
}
