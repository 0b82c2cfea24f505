//! Configuration loading, source validation and checkpoint housekeeping
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use herald::{Herald, SourceError, find_config_file};
use herald_checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore, ListKey};
use herald_common::ValidationError;
use pretty_assertions::assert_eq;

const QUESTIONS: &str = r#"[
    {"question": "2 + 2?", "options": ["3", "4"], "correct_option": 1},
    {"question": "Capital of France?", "options": ["Paris", "Lyon"], "correct_option": 0}
]"#;

fn write_config(dir: &Path, source: &str) -> std::path::PathBuf {
    let config = format!(
        r#"Herald(
            source: {source},
            engine: (destination: "@archive"),
            checkpoint: File(path: "{}"),
            telegram: (token: Some("123:abc")),
        )"#,
        dir.join("checkpoints").display()
    );

    let path = dir.join("herald.config.ron");
    std::fs::write(&path, config).unwrap();
    path
}

fn questions_config(dir: &Path, questions: &str) -> Herald {
    let questions_path = dir.join("questions.json");
    std::fs::write(&questions_path, questions).unwrap();

    let path = write_config(
        dir,
        &format!(r#"Questions(path: "{}")"#, questions_path.display()),
    );
    Herald::from_file(&find_config_file(Some(&path)).unwrap()).unwrap()
}

#[test]
fn test_loads_questions_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let herald = questions_config(dir.path(), QUESTIONS);

    let list = herald.load().unwrap();
    assert_eq!(list.label(), "questions.json");
    assert_eq!(list.len(), 2);
}

#[test]
fn test_invalid_item_is_rejected_with_its_index() {
    let dir = tempfile::tempdir().unwrap();
    let herald = questions_config(
        dir.path(),
        r#"[
            {"question": "ok?", "options": ["yes", "no"], "correct_option": 0},
            {"question": "broken?", "options": ["only"], "correct_option": 0}
        ]"#,
    );

    match herald.load() {
        Err(SourceError::Validation(err)) => assert_eq!(err.index(), Some(1)),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn test_empty_source_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let herald = questions_config(dir.path(), "[]");

    assert!(matches!(
        herald.load(),
        Err(SourceError::Validation(ValidationError::Empty(_)))
    ));
}

#[test]
fn test_forward_range_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let range = dir.path().join("range.txt");
    std::fs::write(&range, "https://t.me/news/10\nhttps://t.me/news/14\n").unwrap();

    let path = write_config(
        dir.path(),
        &format!(r#"ForwardRange(path: "{}")"#, range.display()),
    );
    let list = Herald::from_file(&path).unwrap().load().unwrap();

    assert_eq!(list.len(), 5);
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("herald.config.ron");
    std::fs::write(&path, "Herald(engine: ())").unwrap();

    assert!(Herald::from_file(&path).is_err());
}

#[tokio::test]
async fn test_status_and_reset_follow_the_list_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let herald = questions_config(dir.path(), QUESTIONS);

    let (list, key, checkpoint) = herald.status().await.unwrap();
    assert_eq!(key, ListKey::derive(&list));
    assert_eq!(checkpoint, Checkpoint::default());

    let store = FileCheckpointStore::builder()
        .path(dir.path().join("checkpoints"))
        .build()
        .unwrap();
    let mut progress = Checkpoint::default();
    progress.advance(0);
    store.save(&key, &progress).await.unwrap();

    let (_, _, checkpoint) = herald.status().await.unwrap();
    assert_eq!(checkpoint.last_completed(), Some(0));

    assert_eq!(herald.reset().await.unwrap(), key);
    let (_, _, checkpoint) = herald.status().await.unwrap();
    assert_eq!(checkpoint.last_completed(), None);
}
