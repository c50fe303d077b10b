use super::{date, reading};
use crate::*;
use anyhow::Result;
use dateindex::DateIndex;
use recordlog::{read_at, LogError, RecordLogWriter, NO_PREV};
use std::fs;
use tempfile::tempdir;

// --------------------- Ingest ---------------------

#[test]
fn first_record_of_a_date_has_no_prev() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = Engine::open(dir.path())?;

    let rec = engine.ingest(reading("2024-05-25 14:31:25", "1234 PP-7", 155.5))?;
    assert_eq!(rec.offset, 0);
    assert_eq!(rec.prev_offset, NO_PREV);
    assert_eq!(engine.head(&date("2024-05-25")), Some(0));
    Ok(())
}

#[test]
fn ingest_links_to_head_of_same_date_only() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = Engine::open(dir.path())?;

    let a1 = engine.ingest(reading("2024-05-25 08:00:00", "A 1", 10.0))?;
    let b1 = engine.ingest(reading("2024-05-26 08:00:00", "B 1", 20.0))?;
    let a2 = engine.ingest(reading("2024-05-25 09:00:00", "A 2", 30.0))?;
    let b2 = engine.ingest(reading("2024-05-26 09:00:00", "B 2", 40.0))?;

    assert_eq!(b1.prev_offset, NO_PREV);
    assert_eq!(a2.prev_offset, a1.offset as i64);
    assert_eq!(b2.prev_offset, b1.offset as i64);
    assert_eq!(engine.head(&date("2024-05-25")), Some(a2.offset));
    assert_eq!(engine.head(&date("2024-05-26")), Some(b2.offset));

    // the record on disk matches what ingest returned
    assert_eq!(read_at(engine.log_path(), a2.offset)?, a2);
    Ok(())
}

#[test]
fn offsets_strictly_increase() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = Engine::open(dir.path())?;

    let mut last = None;
    for i in 0..20 {
        let day = 20 + i % 3;
        let rec = engine.ingest(reading(
            &format!("2024-05-{day} 10:00:{:02}", i),
            &format!("P {i}"),
            i as f64,
        ))?;
        if let Some(prev) = last {
            assert!(rec.offset > prev);
        }
        last = Some(rec.offset);
    }
    assert_eq!(engine.dates().len(), 3);
    Ok(())
}

#[test]
fn ingest_raw_rejects_invalid_input_without_writing() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = Engine::open(dir.path())?;
    engine.ingest_raw("2024-05-25 08:00:00", "A 1", 10.0)?;
    let len = fs::metadata(engine.log_path())?.len();

    for (dt, plate, speed) in [
        ("2024-05", "A 2", 10.0),
        ("2024-13-45 08:00:00", "A 2", 10.0),
        ("2024-05-25 08:00:00", "   ", 10.0),
        ("2024-05-25 08:00:00", "A 2", -1.0),
        ("2024-05-25 08:00:00", "A 2", f64::NAN),
    ] {
        let err = engine.ingest_raw(dt, plate, speed).unwrap_err();
        assert!(err.is_validation(), "{dt} {plate} {speed}: {err}");
    }

    assert_eq!(fs::metadata(engine.log_path())?.len(), len);
    assert_eq!(engine.chain(&date("2024-05-25"))?.len(), 1);
    Ok(())
}

// --------------------- Snapshots ---------------------

#[cfg(target_os = "linux")]
#[test]
fn append_failure_leaves_index_untouched() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = Engine::open(dir.path())?;
    engine.ingest_raw("2024-05-25 08:00:00", "A 1", 10.0)?;
    engine.ingest_raw("2024-05-25 09:00:00", "A 2", 20.0)?;

    let day = date("2024-05-25");
    let head = engine.head(&day);
    let chain = engine.chain(&day)?;
    let dates = engine.dates();

    // every write to /dev/full fails with ENOSPC
    engine.writer = RecordLogWriter::open("/dev/full")?;

    for (dt, plate) in [("2024-05-25 10:00:00", "A 3"), ("2024-05-27 10:00:00", "C 1")] {
        let err = engine.ingest_raw(dt, plate, 30.0).unwrap_err();
        assert!(matches!(err, EngineError::Log(_)), "{err}");
    }
    let err = engine.ingest_raw("2024-05-28 10:00:00", "D 1", 40.0).unwrap_err();
    assert!(matches!(err, EngineError::Log(LogError::Io(_))), "{err}");

    assert_eq!(engine.head(&day), head);
    assert_eq!(engine.chain(&day)?, chain);
    assert_eq!(engine.dates(), dates);
    assert_eq!(engine.head(&date("2024-05-27")), None);
    Ok(())
}

#[test]
fn open_with_paths_uses_given_files() -> Result<()> {
    let dir = tempdir()?;
    let log = dir.path().join("readings.log");
    let snapshot = dir.path().join("heads.txt");
    {
        let mut engine = Engine::open_with_paths(&snapshot, &log)?;
        engine.ingest_raw("2024-05-25 08:00:00", "A 1", 10.0)?;
        engine.close()?;
    }
    assert!(log.exists());
    assert!(snapshot.exists());

    let engine = Engine::open_with_paths(&snapshot, &log)?;
    assert_eq!(engine.head(&date("2024-05-25")), Some(0));
    Ok(())
}

#[test]
fn no_periodic_snapshot_by_default() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = Engine::open(dir.path())?;
    engine.ingest_raw("2024-05-25 08:00:00", "A 1", 10.0)?;

    assert!(!engine.snapshot_path().exists());
    assert!(engine.is_dirty());
    Ok(())
}

#[test]
fn periodic_snapshot_every_n_ingests() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = Engine::open(dir.path())?;
    engine.set_snapshot_every(2);
    assert_eq!(engine.snapshot_every(), 2);

    engine.ingest_raw("2024-05-25 08:00:00", "A 1", 10.0)?;
    assert!(!engine.snapshot_path().exists());

    let rec = engine.ingest_raw("2024-05-26 08:00:00", "B 1", 20.0)?;
    assert!(engine.snapshot_path().exists());
    assert!(!engine.is_dirty());

    let saved = DateIndex::load_snapshot(engine.snapshot_path())?;
    assert_eq!(saved.get(&date("2024-05-26")), Some(rec.offset));

    engine.ingest_raw("2024-05-26 09:00:00", "B 2", 30.0)?;
    assert!(engine.is_dirty());
    Ok(())
}

#[test]
fn close_saves_snapshot() -> Result<()> {
    let dir = tempdir()?;
    let mut engine = Engine::open(dir.path())?;
    let a = engine.ingest_raw("2024-05-25 08:00:00", "A 1", 10.0)?;
    let snapshot_path = engine.snapshot_path().to_path_buf();
    engine.close()?;

    assert_eq!(
        fs::read_to_string(&snapshot_path)?,
        format!("1\n2024-05-25 {}\n", a.offset)
    );
    Ok(())
}

#[test]
fn drop_saves_dirty_snapshot() -> Result<()> {
    let dir = tempdir()?;
    {
        let mut engine = Engine::open(dir.path())?;
        engine.ingest_raw("2024-05-25 08:00:00", "A 1", 10.0)?;
        engine.ingest_raw("2024-05-25 09:00:00", "A 2", 11.0)?;
    }

    let saved = DateIndex::load_snapshot(dir.path().join(dateindex::SNAPSHOT_FILENAME))?;
    assert_eq!(saved.len(), 1);
    assert!(saved.get(&date("2024-05-25")).is_some());
    Ok(())
}
