/// Cold-start path: rebuilding the date index from disk.
///
/// The snapshot (`map.txt`) is a cache of the index, not the source of truth.
/// The record log is. Recovery therefore never fails:
///
/// 1. Load the snapshot and check every head against the log.
/// 2. Replay records appended after the snapshot was written (the tail).
/// 3. If the snapshot is missing, unreadable or disagrees with the log,
///    rebuild the whole index with a forward scan of the log.
/// 4. If even the log cannot be scanned, start with an empty index.
use anyhow::{bail, Context, Result};
use dateindex::DateIndex;
use recordlog::{LogError, RecordLogReader};
use std::io::ErrorKind;
use std::path::Path;

/// Recovers the date index for the log at `log_path`.
///
/// Entries added by tail replay or a rebuild leave the index dirty, so the
/// next snapshot save persists them.
pub fn recover_index<P1: AsRef<Path>, P2: AsRef<Path>>(
    snapshot_path: P1,
    log_path: P2,
) -> DateIndex {
    let snapshot_path = snapshot_path.as_ref();
    let log_path = log_path.as_ref();

    match DateIndex::load_snapshot(snapshot_path) {
        Ok(mut index) => match replay_tail(&mut index, log_path) {
            Ok(replayed) => {
                tracing::info!(
                    dates = index.len(),
                    replayed,
                    "date index loaded from snapshot"
                );
                return index;
            }
            Err(e) => {
                tracing::warn!(
                    error = %format!("{e:#}"),
                    "snapshot disagrees with record log, rebuilding"
                );
            }
        },
        Err(e) if e.is_not_found() => {
            tracing::info!(
                path = %snapshot_path.display(),
                "no snapshot, rebuilding from record log"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "unreadable snapshot, rebuilding from record log");
        }
    }

    match rebuild_index(log_path) {
        Ok(index) => index,
        Err(e) => {
            tracing::error!(error = %e, "record log scan failed, starting with an empty index");
            DateIndex::new()
        }
    }
}

/// Builds the index from scratch with one forward scan of the log.
///
/// The last record seen for a date becomes its head. A missing log yields an
/// empty index.
///
/// # Errors
///
/// Only I/O errors abort the scan; undecodable lines are skipped.
pub fn rebuild_index<P: AsRef<Path>>(log_path: P) -> Result<DateIndex, LogError> {
    let mut reader = match RecordLogReader::open(log_path.as_ref()) {
        Ok(r) => r,
        Err(LogError::Io(e)) if e.kind() == ErrorKind::NotFound => return Ok(DateIndex::new()),
        Err(e) => return Err(e),
    };

    let mut index = DateIndex::new();
    let summary = reader.scan(|rec| index.set(rec.reading.date_key(), rec.offset))?;

    tracing::info!(
        dates = index.len(),
        records = summary.records,
        skipped = summary.skipped,
        torn_tail = summary.torn_tail,
        "date index rebuilt from record log"
    );
    Ok(index)
}

/// Checks the snapshot's heads against the log and applies records appended
/// after it. Returns the number of replayed records.
///
/// Every record written after the snapshot lies beyond the newest head, so
/// the scan starts right after that record. A replayed record must link to
/// its date's current head; anything else means the snapshot is stale in a
/// way replay cannot repair.
fn replay_tail(index: &mut DateIndex, log_path: &Path) -> Result<u64> {
    let mut reader = match RecordLogReader::open(log_path) {
        Ok(r) => r,
        Err(LogError::Io(e)) if e.kind() == ErrorKind::NotFound && index.is_empty() => {
            return Ok(0)
        }
        Err(e) => return Err(e).context("failed to open record log"),
    };

    for (date, &head) in index.iter() {
        let rec = reader
            .read_at(head)
            .with_context(|| format!("head of {date} at offset {head}"))?;
        if rec.reading.date_key() != *date {
            bail!(
                "head of {date} at offset {head} holds a reading for {}",
                rec.reading.date_key()
            );
        }
    }

    let start = match index.iter().map(|(_, &off)| off).max() {
        Some(newest) => reader.record_end(newest)?,
        None => 0,
    };

    let mut replayed = 0u64;
    let mut broken_link = None;
    reader.scan_from(start, |rec| {
        if broken_link.is_some() {
            return;
        }
        let date = rec.reading.date_key();
        if rec.prev_offset != index.head_link(&date) {
            broken_link = Some((rec.offset, rec.prev_offset));
            return;
        }
        index.set(date, rec.offset);
        replayed += 1;
    })?;

    if let Some((offset, prev_offset)) = broken_link {
        bail!("record at offset {offset} links to {prev_offset}, not its date's head");
    }
    Ok(replayed)
}
