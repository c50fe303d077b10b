use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::format::decode;
use crate::{LogError, LogRecord};

/// Random-access reader over the record log.
///
/// Generic over any `Read + Seek` so tests can point it at an in-memory
/// `Cursor`. One reader holds one open handle; a chain walk through
/// [`RecordLogReader::chain`] reuses it for every hop.
#[derive(Debug)]
pub struct RecordLogReader<R: Read + Seek> {
    rdr: BufReader<R>,
    line: Vec<u8>,
}

/// Outcome of a full forward scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Records decoded and handed to the visitor.
    pub records: u64,
    /// Complete lines that failed to decode (e.g. sealed torn tails).
    pub skipped: u64,
    /// Whether the scan stopped at a final line with no terminator.
    pub torn_tail: bool,
}

impl RecordLogReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let f = File::open(path)?;
        Ok(Self::from_reader(f))
    }
}

impl<R: Read + Seek> RecordLogReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            rdr: BufReader::new(reader),
            line: Vec::with_capacity(256),
        }
    }

    /// Reads the record whose line begins at `offset`.
    ///
    /// # Errors
    ///
    /// - [`LogError::Truncated`] if EOF arrives before a `\n` (including an
    ///   offset at or past the end of the file).
    /// - [`LogError::Parse`] if the line is malformed.
    /// - [`LogError::Corrupt`] if the record links forward.
    /// - [`LogError::Io`] on seek/read failure.
    pub fn read_at(&mut self, offset: u64) -> Result<LogRecord, LogError> {
        self.rdr.seek(SeekFrom::Start(offset))?;
        self.line.clear();
        self.rdr.read_until(b'\n', &mut self.line)?;
        if self.line.last() != Some(&b'\n') {
            return Err(LogError::Truncated { offset });
        }
        decode(&self.line, offset)
    }

    /// Walks the chain that starts at `head`, newest record first.
    ///
    /// The iterator stops after the record whose `prev_offset` is `-1`, or
    /// after yielding the first error.
    pub fn chain(&mut self, head: u64) -> Chain<'_, R> {
        Chain {
            reader: self,
            next: Some(head),
        }
    }

    /// Reads the record at `offset` and returns the offset just past its line,
    /// i.e. where the next record in file order starts.
    pub fn record_end(&mut self, offset: u64) -> Result<u64, LogError> {
        self.read_at(offset)?;
        Ok(offset + self.line.len() as u64)
    }

    /// Visits every complete record from the start of the log in file order.
    ///
    /// Blank lines are skipped silently. Complete lines that fail to decode
    /// are logged, counted in [`ScanSummary::skipped`] and skipped. A final
    /// line without a terminator ends the scan. Only I/O errors abort.
    pub fn scan<F>(&mut self, visit: F) -> Result<ScanSummary, LogError>
    where
        F: FnMut(LogRecord),
    {
        self.scan_from(0, visit)
    }

    /// Like [`RecordLogReader::scan`], starting at `start`, which must be a
    /// line boundary.
    pub fn scan_from<F>(&mut self, start: u64, mut visit: F) -> Result<ScanSummary, LogError>
    where
        F: FnMut(LogRecord),
    {
        self.rdr.seek(SeekFrom::Start(start))?;
        let mut summary = ScanSummary::default();
        let mut offset = start;

        loop {
            self.line.clear();
            let n = self.rdr.read_until(b'\n', &mut self.line)?;
            if n == 0 {
                break;
            }
            let line_offset = offset;
            offset += n as u64;

            if self.line.last() != Some(&b'\n') {
                summary.torn_tail = true;
                break;
            }
            if self.line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match decode(&self.line, line_offset) {
                Ok(rec) => {
                    summary.records += 1;
                    visit(rec);
                }
                Err(e) => {
                    tracing::warn!(offset = line_offset, error = %e, "skipping unreadable record");
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Iterator over one date's chain, holding the reader's file handle.
#[derive(Debug)]
pub struct Chain<'a, R: Read + Seek> {
    reader: &'a mut RecordLogReader<R>,
    next: Option<u64>,
}

impl<R: Read + Seek> Iterator for Chain<'_, R> {
    type Item = Result<LogRecord, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next.take()?;
        match self.reader.read_at(offset) {
            Ok(rec) => {
                self.next = rec.prev();
                Some(Ok(rec))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Opens the log at `path` and reads the single record at `offset`.
///
/// Convenience for one-off lookups; chain walks should hold a
/// [`RecordLogReader`] instead of reopening the file per hop.
pub fn read_at<P: AsRef<Path>>(path: P, offset: u64) -> Result<LogRecord, LogError> {
    RecordLogReader::open(path)?.read_at(offset)
}
