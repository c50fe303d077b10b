/// # Snapshot - persisted Date Index
///
/// ## File Format
///
/// ```text
/// 3
/// 2024-05-24 0
/// 2024-05-25 412
/// 2024-05-26 318
/// ```
///
/// The first line is the decimal entry count `N`; the next `N` lines are
/// `<date> <offset>` pairs. Entry order carries no meaning (the index is a
/// mapping), but the writer emits them in date order so successive snapshots
/// diff cleanly. Anything after the `N`th entry is ignored.
///
/// ## Crash Safety
///
/// Saving writes `<snapshot>.tmp`, fsyncs it, then renames it over the
/// snapshot, so a crash mid-save leaves the previous snapshot intact. If the
/// rename fails (Windows holding the target open) it falls back to a direct
/// truncate-and-write.
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use recordlog::DateKey;
use thiserror::Error;

use crate::DateIndex;

/// Conventional snapshot file name inside the data directory.
pub const SNAPSHOT_FILENAME: &str = "map.txt";

/// Errors from loading or saving a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// An underlying I/O error (including a missing snapshot file).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The snapshot content is malformed at the given 1-based line.
    #[error("snapshot line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl SnapshotError {
    /// True when the snapshot file simply does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

impl DateIndex {
    /// Loads an index from the snapshot at `path`.
    ///
    /// The returned index is clean (not dirty).
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::Io`] if the file cannot be opened or read.
    /// - [`SnapshotError::Parse`] on a malformed count, a malformed entry, or
    ///   fewer entries than the count announces.
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let file = File::open(path.as_ref())?;
        let mut lines = BufReader::new(file).lines();

        let header = lines.next().transpose()?.ok_or_else(|| SnapshotError::Parse {
            line: 1,
            reason: "empty snapshot (missing entry count)".to_string(),
        })?;
        let count: usize = header.trim().parse().map_err(|e| SnapshotError::Parse {
            line: 1,
            reason: format!("invalid entry count '{}': {}", header.trim(), e),
        })?;

        let mut index = DateIndex::new();
        for i in 0..count {
            let line_num = i + 2;
            let line = lines.next().transpose()?.ok_or_else(|| SnapshotError::Parse {
                line: line_num,
                reason: format!("expected {} entries, found {}", count, i),
            })?;
            let (date, offset) = parse_entry(&line).map_err(|reason| SnapshotError::Parse {
                line: line_num,
                reason,
            })?;
            index.set(date, offset);
        }

        index.mark_clean();
        Ok(index)
    }

    /// Writes the index to `path`, replacing any previous snapshot, and marks
    /// the index clean.
    pub fn save_snapshot<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let tmp_path = tmp_path_for(path);

        {
            let f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            self.write_contents(f)?;
        }

        if let Err(e) = fs::rename(&tmp_path, path) {
            tracing::debug!(error = %e, "snapshot rename failed, rewriting in place");
            let f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            self.write_contents(f)?;
            let _ = fs::remove_file(&tmp_path);
        }

        self.mark_clean();
        Ok(())
    }

    fn write_contents(&self, f: File) -> io::Result<()> {
        let mut w = BufWriter::new(f);
        writeln!(w, "{}", self.len())?;
        for (date, offset) in self.iter() {
            writeln!(w, "{} {}", date, offset)?;
        }
        w.flush()?;
        w.get_ref().sync_all()
    }
}

fn parse_entry(line: &str) -> Result<(DateKey, u64), String> {
    let mut parts = line.split_whitespace();
    let (Some(date), Some(offset), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected '<date> <offset>', got '{}'", line));
    };
    let date = date.parse::<DateKey>().map_err(|e| e.to_string())?;
    let offset = offset
        .parse::<u64>()
        .map_err(|e| format!("invalid offset '{}': {}", offset, e))?;
    Ok((date, offset))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
