use chrono::{NaiveTime, Timelike};
use std::fmt;

/// Time-of-day window during which queries are allowed.
///
/// Comparison is at minute granularity and inclusive at both ends: with
/// `end = 18:30`, a request at `18:30:59` is still inside. When `start` is
/// after `end` the window wraps midnight (`22:00`..`06:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl AccessWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start: truncate_to_minute(start),
            end: truncate_to_minute(end),
        }
    }

    /// A window that never rejects.
    pub fn always() -> Self {
        Self::new(NaiveTime::MIN, minute(23, 59))
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether a request at `now` may be served.
    pub fn allows(&self, now: NaiveTime) -> bool {
        let now = truncate_to_minute(now);
        if self.start <= self.end {
            self.start <= now && now <= self.end
        } else {
            now >= self.start || now <= self.end
        }
    }
}

impl fmt::Display for AccessWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(crate::TIME_FORMAT),
            self.end.format(crate::TIME_FORMAT)
        )
    }
}

fn minute(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    minute(t.hour(), t.minute())
}
