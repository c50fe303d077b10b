use crate::*;

// -------------------- Reading validation --------------------

#[test]
fn parse_valid_reading() {
    let r = Reading::parse("2024-05-25 14:31:25", "1234 PP-7", 155.5).unwrap();
    assert_eq!(r.plate_number(), "1234 PP-7");
    assert_eq!(r.speed_kmph(), 155.5);
    assert_eq!(r.date_key().to_string(), "2024-05-25");
}

#[test]
fn short_datetime_rejected() {
    let err = Reading::parse("2024-05", "1234 PP-7", 10.0).unwrap_err();
    assert!(matches!(err, ValidationError::DatetimeTooShort(_)));
}

#[test]
fn malformed_datetime_rejected() {
    for bad in [
        "2024-13-25 14:31:25",
        "2024-05-25T14:31:25",
        "2024-05-25",
        "2024-05-25 25:00:00",
        "+2024-05-25 14:31:25",
        " 2024-05-25 14:31:25",
        "not-a-date-at-all",
    ] {
        let err = Reading::parse(bad, "1234 PP-7", 10.0).unwrap_err();
        assert!(
            matches!(err, ValidationError::InvalidDatetime(_)),
            "{} should be rejected, got {:?}",
            bad,
            err
        );
    }
}

#[test]
fn empty_plate_rejected() {
    assert_eq!(
        Reading::parse("2024-05-25 14:31:25", "   ", 10.0).unwrap_err(),
        ValidationError::EmptyPlate
    );
}

#[test]
fn plate_with_newline_rejected() {
    assert_eq!(
        Reading::parse("2024-05-25 14:31:25", "12\n34", 10.0).unwrap_err(),
        ValidationError::PlateControlChars
    );
}

#[test]
fn bad_speed_rejected() {
    for speed in [-1.0, f64::NAN, f64::INFINITY] {
        let err = Reading::parse("2024-05-25 14:31:25", "1234 PP-7", speed).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSpeed(_)));
    }
}

#[test]
fn zero_speed_is_valid() {
    assert!(Reading::parse("2024-05-25 14:31:25", "1234 PP-7", 0.0).is_ok());
}

#[test]
fn reading_serializes_to_http_shape() {
    let r = Reading::parse("2024-05-25 14:31:25", "1234 PP-7", 155.5).unwrap();
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "datetime": "2024-05-25 14:31:25",
            "plate_number": "1234 PP-7",
            "speed_kmph": 155.5
        })
    );
}

// -------------------- DateKey --------------------

#[test]
fn date_key_from_timestamp() {
    let key = DateKey::from_timestamp("2024-05-25 14:31:25").unwrap();
    assert_eq!(key.to_string(), "2024-05-25");
}

#[test]
fn date_key_parse_rejects_garbage() {
    assert!("2024-5-25".parse::<DateKey>().is_err());
    assert!("2024-02-30".parse::<DateKey>().is_err());
    assert!("".parse::<DateKey>().is_err());
    assert!("2024-05-25 ".parse::<DateKey>().is_err());
    assert!("+2024-05-2".parse::<DateKey>().is_err());
    assert!("2024-05-+5".parse::<DateKey>().is_err());
}

#[test]
fn parse_keeps_timestamp_text() {
    let r = Reading::parse("2024-05-25 14:31:25", "A 1", 1.0).unwrap();
    assert_eq!(r.datetime(), "2024-05-25 14:31:25");

    let dt = chrono::NaiveDate::from_ymd_opt(2024, 5, 25)
        .unwrap()
        .and_hms_opt(8, 5, 0)
        .unwrap();
    let r = Reading::new(dt, "A 1", 1.0).unwrap();
    assert_eq!(r.datetime(), "2024-05-25 08:05:00");
    assert_eq!(r, Reading::parse("2024-05-25 08:05:00", "A 1", 1.0).unwrap());
}

#[test]
fn date_key_orders_chronologically() {
    let a: DateKey = "2023-12-31".parse().unwrap();
    let b: DateKey = "2024-01-01".parse().unwrap();
    assert!(a < b);
}
