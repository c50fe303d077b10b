//! # Record Log
//!
//! Append-only storage for speed-camera readings.
//!
//! Every reading is written as one newline-terminated line at the end of the
//! log. Besides the reading itself, each line stores `prev_offset`: the byte
//! offset of the previous record with the same [`DateKey`], or `-1` if it is
//! the first record of its date. Following those links from the newest record
//! visits every record of one date without scanning the rest of the log.
//!
//! ```text
//! offset 0    {"datetime":"2024-05-25 14:31:25",...,"prev_offset":-1}
//! offset 98   {"datetime":"2024-05-26 08:00:00",...,"prev_offset":-1}
//! offset 196  {"datetime":"2024-05-25 09:00:00",...,"prev_offset":0}   <- head for 2024-05-25
//! ```
//!
//! Links only point backwards (`prev_offset < offset`), so chains are acyclic
//! by construction. Readers enforce this and report a violation as
//! [`LogError::Corrupt`] instead of looping.
//!
//! The format is line-oriented text so the log can be inspected with any
//! pager. See the `format` module for the exact layouts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use recordlog::{Reading, RecordLogReader, RecordLogWriter, NO_PREV};
//!
//! let mut w = RecordLogWriter::open("data.txt").unwrap();
//! let r = Reading::parse("2024-05-25 14:31:25", "1234 PP-7", 155.5).unwrap();
//! let first = w.append(&r, NO_PREV).unwrap();
//! let second = w.append(&r, first as i64).unwrap();
//!
//! let mut reader = RecordLogReader::open("data.txt").unwrap();
//! for rec in reader.chain(second) {
//!     println!("{:?}", rec.unwrap());
//! }
//! ```

mod format;
mod reader;
mod reading;
mod writer;

use std::io;
use thiserror::Error;

pub use format::V1_TOKENS;
pub use reader::{read_at, Chain, RecordLogReader, ScanSummary};
pub use reading::{
    DateKey, Reading, ValidationError, DATETIME_FORMAT, DATE_FORMAT, DATE_KEY_LEN,
};
pub use writer::RecordLogWriter;

/// `prev_offset` sentinel: no earlier record for this date.
pub const NO_PREV: i64 = -1;

/// A reading as stored in the log, with its position and backward link.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Byte offset at which this record's line begins.
    pub offset: u64,
    /// Offset of the previous record with the same date, or [`NO_PREV`].
    pub prev_offset: i64,
    pub reading: Reading,
}

impl LogRecord {
    /// The previous record's offset, if any.
    pub fn prev(&self) -> Option<u64> {
        (self.prev_offset != NO_PREV).then_some(self.prev_offset as u64)
    }
}

/// Errors that can occur while reading or writing the record log.
#[derive(Debug, Error)]
pub enum LogError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The line at `offset` is not a valid record.
    #[error("malformed record at offset {offset}: {reason}")]
    Parse { offset: u64, reason: String },

    /// End of file was reached before the record's newline.
    #[error("record at offset {offset} is truncated (no newline before end of log)")]
    Truncated { offset: u64 },

    /// A record links to an offset that is not strictly earlier than its own.
    #[error("record at offset {offset} links to {prev_offset}, which is not an earlier record")]
    Corrupt { offset: u64, prev_offset: i64 },

    /// Serializing a record failed.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests;
