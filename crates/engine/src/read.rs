/// Read path: threshold and extremes queries over one date's chain.
///
/// Both queries walk the chain newest to oldest through a single
/// [`RecordLogReader`], so a walk costs one open plus one seek per record.
/// A date missing from the index yields an empty result without touching
/// the log.
use recordlog::{DateKey, LogRecord, Reading, RecordLogReader};

use crate::{Engine, EngineError};

/// Slowest and fastest readings of a date.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremes {
    pub min: Reading,
    pub max: Reading,
}

impl Engine {
    /// Readings on `date` with speed strictly greater than `threshold`,
    /// newest first.
    ///
    /// # Errors
    ///
    /// [`EngineError::Log`] if any record of the chain cannot be read.
    pub fn query_threshold(
        &self,
        date: &DateKey,
        threshold: f64,
    ) -> Result<Vec<Reading>, EngineError> {
        self.fold_chain(date, Vec::new(), |mut out, rec| {
            if rec.reading.speed_kmph() > threshold {
                out.push(rec.reading);
            }
            out
        })
    }

    /// Minimum and maximum speed readings on `date`, or `None` when the date
    /// has no records.
    ///
    /// On ties the first reading visited wins, i.e. the most recent one.
    pub fn query_extremes(&self, date: &DateKey) -> Result<Option<Extremes>, EngineError> {
        self.fold_chain(date, None, |acc: Option<Extremes>, rec| match acc {
            None => Some(Extremes {
                min: rec.reading.clone(),
                max: rec.reading,
            }),
            Some(mut ext) => {
                let speed = rec.reading.speed_kmph();
                if speed < ext.min.speed_kmph() {
                    ext.min = rec.reading.clone();
                }
                if speed > ext.max.speed_kmph() {
                    ext.max = rec.reading;
                }
                Some(ext)
            }
        })
    }

    /// Every record of `date`, newest first, with offsets and links.
    pub fn chain(&self, date: &DateKey) -> Result<Vec<LogRecord>, EngineError> {
        self.fold_chain(date, Vec::new(), |mut out, rec| {
            out.push(rec);
            out
        })
    }

    fn fold_chain<T, F>(&self, date: &DateKey, init: T, mut f: F) -> Result<T, EngineError>
    where
        F: FnMut(T, LogRecord) -> T,
    {
        let Some(head) = self.index.get(date) else {
            return Ok(init);
        };

        let mut reader = RecordLogReader::open(&self.log_path)?;
        let mut acc = init;
        let mut visited = 0u64;
        for rec in reader.chain(head) {
            let rec = rec.map_err(|e| {
                tracing::error!(%date, head, error = %e, "chain walk failed");
                e
            })?;
            visited += 1;
            acc = f(acc, rec);
        }
        tracing::trace!(%date, head, visited, "chain walked");
        Ok(acc)
    }
}
