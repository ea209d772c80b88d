use super::*;

#[test]
fn memory_storage_set_get_remove() {
    let storage = MemoryStorage::new();
    assert!(storage.is_empty());
    storage.set(TOKEN_KEY, "T").unwrap();
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("T"));
    assert_eq!(storage.len(), 1);
    storage.remove(TOKEN_KEY).unwrap();
    assert_eq!(storage.get(TOKEN_KEY), None);
    // Removing twice is fine.
    storage.remove(TOKEN_KEY).unwrap();
}

#[test]
fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    assert_eq!(storage.get(USER_KEY), None);
    storage.set(USER_KEY, "{\"id\":1}").unwrap();
    storage.set(TOKEN_KEY, "T").unwrap();
    drop(storage);

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get(USER_KEY).as_deref(), Some("{\"id\":1}"));
    assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("T"));
    assert_eq!(reopened.path(), path.as_path());
}

#[test]
fn file_storage_remove_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let storage = FileStorage::open(&path).unwrap();
    storage.set(TOKEN_KEY, "T").unwrap();
    storage.remove(TOKEN_KEY).unwrap();
    drop(storage);

    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get(TOKEN_KEY), None);
}

#[test]
fn file_storage_treats_empty_file_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "  \n").unwrap();

    let storage = FileStorage::open(&path).unwrap();
    assert_eq!(storage.get(USER_KEY), None);
}

#[test]
fn file_storage_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
}
