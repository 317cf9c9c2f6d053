// tests/ledger_store.rs
use std::collections::BTreeSet;
use std::fs;

use chrono::{Duration, TimeZone, Utc};
use tech_trends_digest::LedgerStore;

#[tokio::test]
async fn missing_file_is_an_empty_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("nope.json"));
    let l = store.try_load().await.expect("absent is not an error");
    assert!(l.is_empty());
}

#[tokio::test]
async fn corrupt_or_wrong_shape_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("delivered.json");

    fs::write(&p, "{ this is not json").unwrap();
    assert!(LedgerStore::new(&p).try_load().await.is_err());

    fs::write(&p, r#"{"delivered": 42}"#).unwrap();
    assert!(LedgerStore::new(&p).try_load().await.is_err());
}

#[tokio::test]
async fn commit_then_load_round_trips_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("state").join("delivered.json"));
    let urls: BTreeSet<String> = [
        "https://a.test/1",
        "https://b.test/ünïcödé",
        "http://arxiv.org/abs/2509.01234v1",
        "",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    store.commit(urls.clone(), Utc::now()).await.expect("commit ok");
    let loaded = store.try_load().await.unwrap();
    let back: BTreeSet<String> = loaded.urls().map(String::from).collect();
    assert_eq!(back, urls);
}

#[tokio::test]
async fn commit_merges_with_what_is_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("delivered.json"));
    let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 7, 0, 0).unwrap();

    store.commit(["a", "b"], t0).await.unwrap();
    let merged = store.commit(["b", "c"], t0 + Duration::days(1)).await.unwrap();

    assert_eq!(merged.urls().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    let on_disk = store.try_load().await.unwrap();
    assert_eq!(on_disk, merged);
    assert_eq!(on_disk.delivered_at("b"), Some(t0));
}

#[tokio::test]
async fn commit_leaves_no_temp_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::new(dir.path().join("delivered.json"));
    store.commit(["x"], Utc::now()).await.unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["delivered.json".to_string()]);
}

#[tokio::test]
async fn commit_over_corrupt_file_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("delivered.json");
    fs::write(&p, "garbage").unwrap();
    let store = LedgerStore::new(&p);
    store.commit(["fresh"], Utc::now()).await.unwrap();
    assert!(store.try_load().await.unwrap().contains("fresh"));
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_ledger_is_not_overwritten() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("delivered.json");
    let store = LedgerStore::new(&p);
    store.commit(["https://old/1", "https://old/2"], Utc::now()).await.unwrap();
    let before = fs::read(&p).unwrap();

    fs::set_permissions(&p, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&p).is_ok() {
        // root ignores file modes; nothing to check here
        return;
    }

    let res = store.commit(["https://new/3"], Utc::now()).await;
    fs::set_permissions(&p, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(res.is_err(), "commit must fail instead of starting from empty");
    assert_eq!(fs::read(&p).unwrap(), before);
    let l = store.try_load().await.unwrap();
    assert!(l.contains("https://old/1"));
    assert!(!l.contains("https://new/3"));
}

#[tokio::test]
async fn commit_failure_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    // parent "directory" is a regular file, so the ledger cannot be written
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let store = LedgerStore::new(blocker.join("delivered.json"));
    assert!(store.commit(["x"], Utc::now()).await.is_err());
}

#[tokio::test]
async fn retention_is_opt_in_and_applies_at_commit() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("delivered.json");
    let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let later = t0 + Duration::days(40);

    let keep_all = LedgerStore::new(&p);
    keep_all.commit(["old"], t0).await.unwrap();
    keep_all.commit(["new"], later).await.unwrap();
    assert_eq!(keep_all.try_load().await.unwrap().len(), 2);

    let pruning = LedgerStore::new(&p).with_retention_days(Some(30));
    let l = pruning.commit(["newest"], later).await.unwrap();
    assert!(!l.contains("old"));
    assert!(l.contains("new"));
    assert!(l.contains("newest"));
}

#[tokio::test]
async fn legacy_plain_array_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("delivered.json");
    fs::write(&p, r#"["https://a.test","https://b.test"]"#).unwrap();
    let l = LedgerStore::new(&p).try_load().await.unwrap();
    assert!(l.contains("https://a.test"));
    assert!(l.contains("https://b.test"));
}
