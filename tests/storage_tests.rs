// File-backed key-value store.

use companion_voice::{FileStore, KeyValueStore};

#[tokio::test]
async fn absent_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state.json"));

    assert_eq!(store.get("device_id").await.unwrap(), None);
}

#[tokio::test]
async fn values_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = FileStore::new(&path);
    store.put("device_id", "abc-123").await.unwrap();
    assert_eq!(
        store.get("device_id").await.unwrap().as_deref(),
        Some("abc-123")
    );

    let reopened = FileStore::new(&path);
    assert_eq!(
        reopened.get("device_id").await.unwrap().as_deref(),
        Some("abc-123")
    );
}

#[tokio::test]
async fn put_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deep").join("state.json");

    let store = FileStore::new(&path);
    store.put("key", "value").await.unwrap();

    assert_eq!(store.get("key").await.unwrap().as_deref(), Some("value"));
}

#[tokio::test]
async fn puts_preserve_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state.json"));

    store.put("first", "1").await.unwrap();
    store.put("second", "2").await.unwrap();

    assert_eq!(store.get("first").await.unwrap().as_deref(), Some("1"));
    assert_eq!(store.get("second").await.unwrap().as_deref(), Some("2"));
}

#[tokio::test]
async fn corrupt_file_surfaces_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    tokio::fs::write(&path, b"not json").await.unwrap();

    let store = FileStore::new(&path);
    assert!(store.get("device_id").await.is_err());
}
