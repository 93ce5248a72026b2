// tests/dedup_store.rs
use std::collections::BTreeMap;
use std::fs;

use chrono::{DateTime, Duration, TimeZone, Utc};

use alert_wire::dedup::SeenStore;
use alert_wire::error::PersistenceError;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
}

fn secs(t: DateTime<Utc>) -> f64 {
    t.timestamp() as f64
}

fn read_raw(path: &std::path::Path) -> BTreeMap<String, f64> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn entries_older_than_retention_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let body = serde_json::json!({
        "fresh": secs(now() - Duration::days(1)),
        "old": secs(now() - Duration::days(8)),
        "edge": secs(now() - Duration::days(7)),
    });
    fs::write(&path, body.to_string()).unwrap();

    let seen = SeenStore::new(&path).load(now()).unwrap();
    assert!(seen.contains("fresh"));
    assert!(!seen.contains("old"));
    // strictly newer than the cutoff
    assert!(!seen.contains("edge"));
}

#[test]
fn save_keeps_existing_stamps_and_purges() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let first = now() - Duration::hours(3);
    fs::write(
        &path,
        serde_json::json!({
            "a": secs(first),
            "stale": secs(now() - Duration::days(9)),
        })
        .to_string(),
    )
    .unwrap();

    let store = SeenStore::new(&path);
    let n = store.save(&["a".into(), "b".into()], now()).unwrap();
    assert_eq!(n, 2);

    let raw = read_raw(&path);
    assert_eq!(raw["a"], secs(first), "existing id must not be re-stamped");
    assert_eq!(raw["b"], secs(now()));
    assert!(!raw.contains_key("stale"));

    // saving again is a no-op on content
    store.save(&["a".into(), "b".into()], now() + Duration::minutes(5)).unwrap();
    assert_eq!(read_raw(&path), raw);
}

#[test]
fn save_rereads_file_before_merging() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let store = SeenStore::new(&path);
    store.save(&["x".into()], now()).unwrap();

    // another writer adds an id between our load and save
    let mut raw = read_raw(&path);
    raw.insert("other".into(), secs(now()));
    fs::write(&path, serde_json::to_string(&raw).unwrap()).unwrap();

    store.save(&["y".into()], now()).unwrap();
    let seen = store.load(now()).unwrap();
    for id in ["x", "y", "other"] {
        assert!(seen.contains(id), "{id} missing");
    }
}

#[test]
fn corrupt_file_is_reported_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    fs::write(&path, "[1, 2").unwrap();
    assert!(matches!(
        SeenStore::new(&path).load(now()),
        Err(PersistenceError::Corrupt { .. })
    ));
}

#[test]
fn custom_retention() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let store = SeenStore::new(&path).with_retention(Duration::hours(1));
    store.save(&["a".into()], now() - Duration::hours(2)).unwrap();
    assert!(store.load(now()).unwrap().is_empty());
}
