/// Write path: `ingest()`, `ingest_raw()` and the periodic snapshot.
///
/// Every reading is appended to the record log linked to its date's current
/// head, and only then does the index move to the new record. A failed append
/// leaves the index untouched.
use recordlog::{LogRecord, Reading};

use crate::{Engine, EngineError};

impl Engine {
    /// Stores a validated reading and returns the record as written.
    ///
    /// # Errors
    ///
    /// [`EngineError::Log`] if the append fails; the index is not modified.
    /// A failing periodic snapshot is logged, not returned: the record is
    /// already durable in the log.
    pub fn ingest(&mut self, reading: Reading) -> Result<LogRecord, EngineError> {
        let date = reading.date_key();
        let prev_offset = self.index.head_link(&date);

        // Append to the log first
        let offset = self.writer.append(&reading, prev_offset)?;

        // Then move the head
        self.index.set(date, offset);

        tracing::debug!(
            %date,
            offset,
            prev_offset,
            plate = reading.plate_number(),
            speed = reading.speed_kmph(),
            "reading ingested"
        );

        self.maybe_snapshot();

        Ok(LogRecord {
            offset,
            prev_offset,
            reading,
        })
    }

    /// Validates raw fields and ingests the resulting reading.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] if the timestamp, plate or speed is
    /// rejected; nothing is written in that case.
    pub fn ingest_raw(
        &mut self,
        datetime: &str,
        plate_number: &str,
        speed_kmph: f64,
    ) -> Result<LogRecord, EngineError> {
        let reading = Reading::parse(datetime, plate_number, speed_kmph)?;
        self.ingest(reading)
    }

    fn maybe_snapshot(&mut self) {
        if self.snapshot_every == 0 {
            return;
        }
        self.ingests_since_snapshot += 1;
        if self.ingests_since_snapshot < self.snapshot_every {
            return;
        }
        if let Err(e) = self.save_snapshot() {
            tracing::warn!(error = %e, "periodic snapshot failed");
        }
    }
}
