#![allow(clippy::expect_used, clippy::unwrap_used)]

use herald_checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore, ListKey};
use tempfile::TempDir;

async fn store() -> (TempDir, FileCheckpointStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileCheckpointStore::builder()
        .path(dir.path())
        .build()
        .expect("valid path");
    store.init().await.expect("init");
    (dir, store)
}

fn key() -> ListKey {
    ListKey::new("polls-0123456789abcdef").unwrap()
}

#[tokio::test]
async fn test_missing_checkpoint_loads_as_default() {
    let (_dir, store) = store().await;
    let checkpoint = store.load(&key()).await;

    assert_eq!(checkpoint.last_completed_index(), -1);
    assert!(checkpoint.failed().is_empty());
}

#[tokio::test]
async fn test_saved_checkpoint_survives_a_new_store() {
    let (dir, store) = store().await;

    let mut checkpoint = Checkpoint::default();
    checkpoint.advance(41);
    checkpoint.record_failure(42);
    store.save(&key(), &checkpoint).await.unwrap();

    let reopened = FileCheckpointStore::builder()
        .path(dir.path())
        .build()
        .unwrap();
    let loaded = reopened.load(&key()).await;

    assert_eq!(loaded.last_completed(), Some(42));
    assert_eq!(loaded.failed(), &[42]);
}

#[tokio::test]
async fn test_corrupt_checkpoint_loads_as_default() {
    let (dir, store) = store().await;
    std::fs::write(dir.path().join(format!("{}.ckpt", key())), b"\xff\xff\xff not a checkpoint")
        .unwrap();

    let checkpoint = store.load(&key()).await;
    assert_eq!(checkpoint, Checkpoint::default());
}

#[tokio::test]
async fn test_trailing_bytes_are_treated_as_corruption() {
    let (dir, store) = store().await;

    let mut checkpoint = Checkpoint::default();
    checkpoint.advance(5);
    store.save(&key(), &checkpoint).await.unwrap();

    let file = dir.path().join(format!("{}.ckpt", key()));
    let mut bytes = std::fs::read(&file).unwrap();
    bytes.extend_from_slice(b"garbage");
    std::fs::write(&file, bytes).unwrap();

    assert_eq!(store.load(&key()).await.last_completed_index(), -1);
}

#[tokio::test]
async fn test_save_never_moves_backwards() {
    let (_dir, store) = store().await;

    let mut ahead = Checkpoint::default();
    ahead.advance(100);
    store.save(&key(), &ahead).await.unwrap();

    let mut behind = Checkpoint::default();
    behind.advance(7);
    store.save(&key(), &behind).await.unwrap();

    assert_eq!(store.load(&key()).await.last_completed(), Some(100));
}

#[tokio::test]
async fn test_save_leaves_no_temporary_files() {
    let (dir, store) = store().await;

    for index in 0..5 {
        let mut checkpoint = Checkpoint::default();
        checkpoint.advance(index);
        store.save(&key(), &checkpoint).await.unwrap();
    }

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, vec![format!("{}.ckpt", key())]);
}

#[tokio::test]
async fn test_init_removes_interrupted_writes() {
    let (dir, store) = store().await;
    let torn = dir.path().join(format!(".tmp_{}.ckpt", key()));
    std::fs::write(&torn, b"half").unwrap();

    store.init().await.unwrap();

    assert!(!torn.exists());
    assert_eq!(store.load(&key()).await.last_completed_index(), -1);
}

#[tokio::test]
async fn test_init_rejects_a_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"").unwrap();

    let store = FileCheckpointStore::builder().path(&file).build().unwrap();
    assert!(store.init().await.is_err());
}

#[tokio::test]
async fn test_clear_forgets_progress() {
    let (_dir, store) = store().await;

    let mut checkpoint = Checkpoint::default();
    checkpoint.advance(3);
    store.save(&key(), &checkpoint).await.unwrap();

    store.clear(&key()).await.unwrap();
    store.clear(&key()).await.unwrap();

    assert_eq!(store.load(&key()).await.last_completed_index(), -1);
}

#[test]
fn test_builder_rejects_parent_components() {
    assert!(FileCheckpointStore::builder().path("../elsewhere").build().is_err());
}
