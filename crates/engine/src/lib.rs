//! # Engine - speed-camera storage engine
//!
//! Ties the [`recordlog`] and [`dateindex`] crates together into the ingest
//! and query paths.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → head = index[date] (or -1)         │
//! │              |                                │
//! │              v                                │
//! │            log append(reading, head)          │
//! │              |  ok                            │
//! │              v                                │
//! │            index[date] = new offset           │
//! │                                               │
//! │ read.rs  → index[date] → chain walk via       │
//! │            prev_offset until -1 (one handle)  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                  |
//! |--------------|----------------------------------------------------------|
//! | [`lib.rs`]   | `Engine` struct, constructor, accessors, `Debug`, `Drop` |
//! | [`recovery`] | Snapshot load, tail replay, full rebuild from the log    |
//! | [`write`]    | `ingest()`, `ingest_raw()`, periodic snapshots           |
//! | [`read`]     | `query_threshold()`, `query_extremes()`, `chain()`       |
//!
//! ## Crash Safety
//!
//! The index is only updated after the record's bytes are appended, so it
//! never points at a record that does not exist. The index itself is only
//! persisted at snapshot points; records appended after the last snapshot
//! are picked up again by [`recovery`] on the next start.
mod read;
mod recovery;
mod write;

use anyhow::{Context, Result};
use dateindex::{DateIndex, SnapshotError, SNAPSHOT_FILENAME};
use recordlog::{DateKey, LogError, RecordLogWriter, ValidationError};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use read::Extremes;
pub use recovery::{rebuild_index, recover_index};

/// Name of the record log file within the data directory.
pub const LOG_FILENAME: &str = "data.txt";

/// Errors surfaced by the ingest and query paths.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The reading was rejected before anything was written.
    #[error("invalid reading: {0}")]
    Validation(#[from] ValidationError),

    /// Reading or appending the record log failed.
    #[error("record log: {0}")]
    Log(#[from] LogError),

    /// Persisting the date index failed.
    #[error("snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl EngineError {
    /// True for errors caused by the caller's input rather than storage.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// The storage engine: an append-only record log plus its date index.
///
/// # Write Path
///
/// 1. Look up the date's current head (or `-1`).
/// 2. Append the reading linked to that head.
/// 3. Point the index at the new record.
/// 4. Every `snapshot_every` ingests, persist the index.
///
/// # Read Path
///
/// 1. Look up the date's head; absent means an empty result.
/// 2. Walk `prev_offset` links newest to oldest with one open log handle,
///    folding over the visited readings.
///
/// # Recovery
///
/// On construction ([`Engine::open`]) the index is loaded from the snapshot
/// and topped up from the log tail; see [`recover_index`].
pub struct Engine {
    pub(crate) index: DateIndex,
    pub(crate) writer: RecordLogWriter,
    pub(crate) log_path: PathBuf,
    pub(crate) snapshot_path: PathBuf,

    /// Save the snapshot after this many ingests. `0` disables periodic saves.
    pub(crate) snapshot_every: usize,
    pub(crate) ingests_since_snapshot: usize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("log_path", &self.log_path)
            .field("snapshot_path", &self.snapshot_path)
            .field("dates", &self.index.len())
            .field("dirty", &self.index.is_dirty())
            .field("snapshot_every", &self.snapshot_every)
            .field("ingests_since_snapshot", &self.ingests_since_snapshot)
            .finish()
    }
}

impl Engine {
    /// Opens the engine rooted at `data_dir`, recovering the date index.
    ///
    /// # Steps
    ///
    /// 1. Create `data_dir` if it does not exist.
    /// 2. Recover the index from `map.txt` and `data.txt` (never fatal).
    /// 3. Open the log writer, sealing a torn tail if the last append was
    ///    interrupted.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        Self::open_with_paths(data_dir.join(SNAPSHOT_FILENAME), data_dir.join(LOG_FILENAME))
    }

    /// Opens the engine on an explicit snapshot and log path. Parent
    /// directories must already exist.
    pub fn open_with_paths<P1: AsRef<Path>, P2: AsRef<Path>>(
        snapshot_path: P1,
        log_path: P2,
    ) -> Result<Self> {
        let snapshot_path = snapshot_path.as_ref().to_path_buf();
        let log_path = log_path.as_ref().to_path_buf();

        // recover before opening the writer so sealing never races the scan
        let index = recover_index(&snapshot_path, &log_path);

        let writer = RecordLogWriter::open(&log_path)
            .with_context(|| format!("failed to open record log {}", log_path.display()))?;

        let engine = Self {
            index,
            writer,
            log_path,
            snapshot_path,
            snapshot_every: 0,
            ingests_since_snapshot: 0,
        };
        tracing::info!(?engine, "engine opened");
        Ok(engine)
    }

    /// Persists the date index to the snapshot file.
    pub fn save_snapshot(&mut self) -> Result<(), EngineError> {
        self.index.save_snapshot(&self.snapshot_path)?;
        self.ingests_since_snapshot = 0;
        tracing::debug!(dates = self.index.len(), "snapshot saved");
        Ok(())
    }

    /// Saves the snapshot and shuts the engine down.
    pub fn close(mut self) -> Result<(), EngineError> {
        self.save_snapshot()
    }

    /// Returns the periodic snapshot interval (0 = disabled).
    #[must_use]
    pub fn snapshot_every(&self) -> usize {
        self.snapshot_every
    }

    /// Updates the periodic snapshot interval. Set to `0` to only save on
    /// shutdown.
    pub fn set_snapshot_every(&mut self, every: usize) {
        self.snapshot_every = every;
    }

    /// Dates that have at least one record, ascending.
    pub fn dates(&self) -> Vec<DateKey> {
        self.index.iter().map(|(d, _)| *d).collect()
    }

    /// Head offset for `date`, if any.
    pub fn head(&self, date: &DateKey) -> Option<u64> {
        self.index.get(date)
    }

    /// Whether the index has changes not yet in the snapshot.
    pub fn is_dirty(&self) -> bool {
        self.index.is_dirty()
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

/// Best-effort snapshot on drop.
///
/// Errors are logged and otherwise ignored: the records themselves are
/// already in the log and recovery rebuilds whatever the snapshot misses.
impl Drop for Engine {
    fn drop(&mut self) {
        if self.index.is_dirty() {
            if let Err(e) = self.save_snapshot() {
                tracing::error!(error = %e, "failed to save snapshot on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests;
