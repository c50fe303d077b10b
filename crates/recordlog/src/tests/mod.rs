mod reading_tests;

use crate::Reading;

pub(crate) fn reading(datetime: &str, plate: &str, speed: f64) -> Reading {
    Reading::parse(datetime, plate, speed).unwrap()
}
