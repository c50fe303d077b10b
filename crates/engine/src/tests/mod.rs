mod write_tests;

use recordlog::{DateKey, Reading};

pub(crate) fn reading(datetime: &str, plate: &str, speed: f64) -> Reading {
    Reading::parse(datetime, plate, speed).unwrap()
}

pub(crate) fn date(s: &str) -> DateKey {
    s.parse().unwrap()
}

/// Plates of `readings`, in order.
pub(crate) fn plates(readings: &[Reading]) -> Vec<&str> {
    readings.iter().map(|r| r.plate_number()).collect()
}
