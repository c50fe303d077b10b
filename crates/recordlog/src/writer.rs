use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::format::encode_into;
use crate::{LogError, Reading, NO_PREV};

/// Append-only writer for the record log.
///
/// Each record is encoded into a reusable buffer and written with a single
/// `write_all`, followed by a flush. The returned offset is where the record's
/// line begins; it is the value a later record's `prev_offset` (or a date
/// index entry) uses to reference it.
///
/// The writer does not fsync on append. Call [`RecordLogWriter::sync_to_disk`]
/// when a durability point is needed.
#[derive(Debug)]
pub struct RecordLogWriter {
    file: File,
    path: PathBuf,
    /// Set when a failed write could not be rolled back; the next append
    /// seals the tail first.
    torn: bool,
    buf: Vec<u8>,
}

impl RecordLogWriter {
    /// Opens (or creates) the log in append mode.
    ///
    /// If the existing file does not end with a newline (a crash interrupted
    /// an append), a single `\n` is written so the next record starts on its
    /// own line. The torn bytes are never referenced by any index entry.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        let mut writer = Self {
            file,
            path,
            torn: true,
            buf: Vec::with_capacity(256),
        };
        writer.seal_torn_tail()?;
        Ok(writer)
    }

    /// Appends `reading` linked to `prev_offset` and returns the new record's offset.
    ///
    /// `prev_offset` must be [`NO_PREV`] or the offset of a record already in
    /// the log; a forward link is rejected with [`LogError::Corrupt`] before
    /// anything is written.
    pub fn append(&mut self, reading: &Reading, prev_offset: i64) -> Result<u64, LogError> {
        if self.torn {
            self.seal_torn_tail()?;
        }

        let offset = self.file.seek(SeekFrom::End(0))?;
        if prev_offset != NO_PREV && (prev_offset < 0 || prev_offset as u64 >= offset) {
            return Err(LogError::Corrupt {
                offset,
                prev_offset,
            });
        }

        self.buf.clear();
        encode_into(&mut self.buf, reading, prev_offset)?;

        if let Err(e) = self
            .file
            .write_all(&self.buf)
            .and_then(|()| self.file.flush())
        {
            self.rollback_to(offset);
            return Err(e.into());
        }

        tracing::trace!(offset, prev_offset, bytes = self.buf.len(), "appended record");
        Ok(offset)
    }

    /// Forces written records to stable storage via `sync_all()`.
    pub fn sync_to_disk(&mut self) -> Result<(), LogError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Current length of the log in bytes (the offset the next record gets).
    pub fn len(&self) -> Result<u64, LogError> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, LogError> {
        Ok(self.len()? == 0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drops whatever a failed append left past `offset`. If the file cannot
    /// be truncated the tail is sealed before the next append instead.
    pub(crate) fn rollback_to(&mut self, offset: u64) {
        match self.file.set_len(offset) {
            Ok(()) => self.torn = false,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    offset,
                    error = %e,
                    "could not truncate failed append"
                );
                self.torn = true;
            }
        }
    }

    fn seal_torn_tail(&mut self) -> Result<(), LogError> {
        let len = self.file.metadata()?.len();
        if len > 0 {
            let mut last = [0u8; 1];
            self.file.seek(SeekFrom::Start(len - 1))?;
            self.file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                tracing::warn!(
                    path = %self.path.display(),
                    offset = len,
                    "record log ends with a partial line; sealing it"
                );
                self.file.write_all(b"\n")?;
                self.file.flush()?;
            }
        }
        self.torn = false;
        Ok(())
    }
}
