use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Timestamp layout accepted on ingest and written to the log.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of a [`DateKey`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the date portion of a timestamp (`YYYY-MM-DD`).
pub const DATE_KEY_LEN: usize = 10;

/// Reasons an untrusted reading (or date) is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("datetime '{0}' is too short (expected YYYY-MM-DD HH:MM:SS)")]
    DatetimeTooShort(String),

    #[error("datetime '{0}' is not a valid YYYY-MM-DD HH:MM:SS timestamp")]
    InvalidDatetime(String),

    #[error("date '{0}' is not a valid YYYY-MM-DD date")]
    InvalidDate(String),

    #[error("plate number must not be empty")]
    EmptyPlate,

    #[error("plate number must not contain control characters")]
    PlateControlChars,

    #[error("speed must be a finite, non-negative number (got {0})")]
    InvalidSpeed(f64),
}

/// The date portion of a reading's timestamp; partitions the log into chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Extracts the key from the first ten characters of a timestamp.
    pub fn from_timestamp(ts: &str) -> Result<Self, ValidationError> {
        let date = ts
            .get(..DATE_KEY_LEN)
            .ok_or_else(|| ValidationError::DatetimeTooShort(ts.to_string()))?;
        date.parse()
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    /// Accepts exactly `YYYY-MM-DD`: ten ASCII bytes, digits with dashes at
    /// positions 4 and 7, naming a real calendar day.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let shape_ok = s.len() == DATE_KEY_LEN
            && s.bytes().enumerate().all(|(i, b)| match i {
                4 | 7 => b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(ValidationError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate(s.to_string()))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

/// A single speed-camera observation.
///
/// Readings from clients go through [`Reading::new`] / [`Reading::parse`],
/// which validate every field. Readings decoded from the log only need a
/// usable date key, since the log may hold records from the earlier service
/// that never applied those rules.
///
/// The timestamp is kept as received, so the echo and the stored line match
/// the input byte for byte. Serializes to the JSON shape used on the HTTP
/// surface:
///
/// ```text
/// {"datetime":"2024-05-25 14:31:25","plate_number":"1234 PP-7","speed_kmph":155.5}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    datetime: String,
    #[serde(skip)]
    date: DateKey,
    plate_number: String,
    speed_kmph: f64,
}

impl Reading {
    pub fn new(
        datetime: NaiveDateTime,
        plate_number: impl Into<String>,
        speed_kmph: f64,
    ) -> Result<Self, ValidationError> {
        let plate_number = plate_number.into();
        validate_fields(&plate_number, speed_kmph)?;
        Ok(Self {
            datetime: datetime.format(DATETIME_FORMAT).to_string(),
            date: DateKey(datetime.date()),
            plate_number,
            speed_kmph,
        })
    }

    /// Validates a raw `YYYY-MM-DD HH:MM:SS` timestamp and builds a reading.
    ///
    /// The first ten characters must be a literal `YYYY-MM-DD`; a signed or
    /// padded year is rejected even where chrono would accept it.
    pub fn parse(
        datetime: &str,
        plate_number: impl Into<String>,
        speed_kmph: f64,
    ) -> Result<Self, ValidationError> {
        if datetime.len() < DATE_KEY_LEN {
            return Err(ValidationError::DatetimeTooShort(datetime.to_string()));
        }
        let invalid = || ValidationError::InvalidDatetime(datetime.to_string());
        let date = DateKey::from_timestamp(datetime).map_err(|_| invalid())?;
        NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT).map_err(|_| invalid())?;

        let plate_number = plate_number.into();
        validate_fields(&plate_number, speed_kmph)?;
        Ok(Self {
            datetime: datetime.to_string(),
            date,
            plate_number,
            speed_kmph,
        })
    }

    /// Rebuilds a reading read back from the log. Only the date key has to
    /// be derivable; time, plate and speed are taken as stored.
    pub(crate) fn from_log(
        datetime: String,
        plate_number: String,
        speed_kmph: f64,
    ) -> Result<Self, ValidationError> {
        let date = DateKey::from_timestamp(&datetime)?;
        Ok(Self {
            datetime,
            date,
            plate_number,
            speed_kmph,
        })
    }

    /// The timestamp text as received.
    pub fn datetime(&self) -> &str {
        &self.datetime
    }

    pub fn plate_number(&self) -> &str {
        &self.plate_number
    }

    pub fn speed_kmph(&self) -> f64 {
        self.speed_kmph
    }

    pub fn date_key(&self) -> DateKey {
        self.date
    }
}

fn validate_fields(plate_number: &str, speed_kmph: f64) -> Result<(), ValidationError> {
    if plate_number.trim().is_empty() {
        return Err(ValidationError::EmptyPlate);
    }
    if plate_number.chars().any(char::is_control) {
        return Err(ValidationError::PlateControlChars);
    }
    if !speed_kmph.is_finite() || speed_kmph < 0.0 {
        return Err(ValidationError::InvalidSpeed(speed_kmph));
    }
    Ok(())
}
