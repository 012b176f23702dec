//! Settings Store Integration Tests

use insight_engine::storage::SettingsStore;
use insight_engine::{AppError, InsightSettings, SettingsUpdate};

#[test]
fn test_creates_defaults_when_absent() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("nested").join("config.json");
    let store = SettingsStore::open(&path).unwrap();

    assert!(path.exists());
    assert_eq!(store.settings().cache_ttl_secs, 300);
    let on_disk: InsightSettings =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.tool_timeout_secs, 8);
}

#[test]
fn test_update_persists_and_reloads() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    let mut store = SettingsStore::open(&path).unwrap();
    store
        .update(SettingsUpdate {
            cache_max_entries: Some(32),
            stream_timeout_secs: Some(60),
            ..Default::default()
        })
        .unwrap();

    let reopened = SettingsStore::open(&path).unwrap();
    assert_eq!(reopened.settings().cache_max_entries, 32);
    assert_eq!(reopened.settings().stream_timeout_secs, 60);
}

#[test]
fn test_invalid_update_is_not_persisted() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    let mut store = SettingsStore::open(&path).unwrap();
    let err = store
        .update(SettingsUpdate {
            tool_timeout_secs: Some(0),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let reopened = SettingsStore::open(&path).unwrap();
    assert_eq!(reopened.settings().tool_timeout_secs, 8);
}

#[test]
fn test_corrupt_file_is_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        SettingsStore::open(&path),
        Err(AppError::Serialization(_))
    ));
}

#[test]
fn test_reset_restores_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.json");
    std::fs::write(&path, r#"{"cache_ttl_secs": 30}"#).unwrap();
    let mut store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.settings().cache_ttl_secs, 30);
    store.reset().unwrap();
    store.reload().unwrap();
    assert_eq!(store.settings().cache_ttl_secs, 300);
}
