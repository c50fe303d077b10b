use super::*;
use std::fs;
use tempfile::tempdir;

fn key(s: &str) -> DateKey {
    s.parse().unwrap()
}

// -------------------- In-memory behaviour --------------------

#[test]
fn get_and_set() {
    let mut idx = DateIndex::new();
    assert!(idx.is_empty());
    assert_eq!(idx.get(&key("2024-05-25")), None);
    assert_eq!(idx.head_link(&key("2024-05-25")), NO_PREV);

    idx.set(key("2024-05-25"), 0);
    idx.set(key("2024-05-25"), 120);
    idx.set(key("2024-05-26"), 60);

    assert_eq!(idx.len(), 2);
    assert_eq!(idx.get(&key("2024-05-25")), Some(120));
    assert_eq!(idx.head_link(&key("2024-05-26")), 60);
    assert!(idx.is_dirty());
}

#[test]
fn iter_is_date_ordered() {
    let idx: DateIndex = vec![
        (key("2024-05-26"), 10),
        (key("2023-01-01"), 20),
        (key("2024-05-25"), 30),
    ]
    .into_iter()
    .collect();

    let dates: Vec<String> = idx.iter().map(|(d, _)| d.to_string()).collect();
    assert_eq!(dates, vec!["2023-01-01", "2024-05-25", "2024-05-26"]);
}

#[test]
fn from_iter_last_offset_wins() {
    let idx: DateIndex = vec![(key("2024-05-25"), 0), (key("2024-05-25"), 90)]
        .into_iter()
        .collect();
    assert_eq!(idx.get(&key("2024-05-25")), Some(90));
}

// -------------------- Snapshot round-trip --------------------

#[test]
fn save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SNAPSHOT_FILENAME);

    let mut idx = DateIndex::new();
    idx.set(key("2024-05-25"), 412);
    idx.set(key("2024-05-24"), 0);
    idx.set(key("2024-05-26"), 318);
    idx.save_snapshot(&path).unwrap();
    assert!(!idx.is_dirty());

    let loaded = DateIndex::load_snapshot(&path).unwrap();
    assert_eq!(loaded, idx);
    assert!(!loaded.is_dirty());

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text, "3\n2024-05-24 0\n2024-05-25 412\n2024-05-26 318\n");
    assert!(!dir.path().join("map.txt.tmp").exists());
}

#[test]
fn save_overwrites_previous_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SNAPSHOT_FILENAME);

    let mut idx = DateIndex::new();
    idx.set(key("2024-05-25"), 1);
    idx.set(key("2024-05-26"), 2);
    idx.save_snapshot(&path).unwrap();

    let mut smaller = DateIndex::new();
    smaller.set(key("2024-05-27"), 3);
    smaller.save_snapshot(&path).unwrap();

    let loaded = DateIndex::load_snapshot(&path).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get(&key("2024-05-27")), Some(3));
}

#[test]
fn empty_index_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SNAPSHOT_FILENAME);

    DateIndex::new().save_snapshot(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "0\n");
    assert!(DateIndex::load_snapshot(&path).unwrap().is_empty());
}

#[test]
fn unordered_entries_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SNAPSHOT_FILENAME);
    fs::write(&path, "2\n2024-05-26 318\n2024-05-25 0\n").unwrap();

    let idx = DateIndex::load_snapshot(&path).unwrap();
    assert_eq!(idx.get(&key("2024-05-25")), Some(0));
    assert_eq!(idx.get(&key("2024-05-26")), Some(318));
}

#[test]
fn trailing_lines_after_count_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SNAPSHOT_FILENAME);
    fs::write(&path, "1\n2024-05-25 7\ngarbage here\n").unwrap();

    let idx = DateIndex::load_snapshot(&path).unwrap();
    assert_eq!(idx.len(), 1);
}

// -------------------- Malformed snapshots --------------------

fn load_err(content: &str) -> SnapshotError {
    let dir = tempdir().unwrap();
    let path = dir.path().join(SNAPSHOT_FILENAME);
    fs::write(&path, content).unwrap();
    DateIndex::load_snapshot(&path).unwrap_err()
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let err = DateIndex::load_snapshot(dir.path().join(SNAPSHOT_FILENAME)).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn empty_file_is_parse_error() {
    assert!(matches!(load_err(""), SnapshotError::Parse { line: 1, .. }));
}

#[test]
fn bad_count_is_parse_error() {
    assert!(matches!(load_err("two\n"), SnapshotError::Parse { line: 1, .. }));
    assert!(matches!(load_err("-1\n"), SnapshotError::Parse { line: 1, .. }));
}

#[test]
fn short_file_is_parse_error() {
    let err = load_err("3\n2024-05-25 0\n");
    assert!(matches!(err, SnapshotError::Parse { line: 3, .. }));
    assert!(!err.is_not_found());
}

#[test]
fn bad_entries_are_parse_errors() {
    for content in [
        "1\n2024-05-25\n",
        "1\n2024-05-25 abc\n",
        "1\n2024-05-25 -1\n",
        "1\n25/05/2024 10\n",
        "1\n2024-05-25 10 extra\n",
    ] {
        let err = load_err(content);
        assert!(
            matches!(err, SnapshotError::Parse { line: 2, .. }),
            "{:?} should fail on line 2, got {:?}",
            content,
            err
        );
    }
}
