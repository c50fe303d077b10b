/// Line codec for log records.
///
/// Two layouts exist. The writer only produces v2; the decoder accepts both so
/// logs written by the earlier service stay readable.
///
/// ```text
/// v2: {"datetime":"2024-05-25 14:31:25","plate_number":"1234 PP-7","speed_kmph":155.5,"prev_offset":-1}\n
/// v1: 2024-05-25 14:31:25 1234 PP-7 155.5 -1\n
/// ```
///
/// v1 is a fixed six-token layout split on single spaces, which is why the
/// plate number must contain exactly one space there. v2 lines always start
/// with `{`, which is how the decoder tells them apart.
use serde::{Deserialize, Serialize};

use crate::{LogError, LogRecord, Reading, NO_PREV};

/// Number of space-separated tokens in a v1 line.
pub const V1_TOKENS: usize = 6;

#[derive(Serialize)]
struct RecordLineRef<'a> {
    #[serde(flatten)]
    reading: &'a Reading,
    prev_offset: i64,
}

#[derive(Deserialize)]
struct RecordLine {
    datetime: String,
    plate_number: String,
    speed_kmph: f64,
    prev_offset: i64,
}

/// Appends the v2 encoding of one record (including the trailing newline) to `buf`.
pub(crate) fn encode_into(
    buf: &mut Vec<u8>,
    reading: &Reading,
    prev_offset: i64,
) -> Result<(), LogError> {
    serde_json::to_writer(
        &mut *buf,
        &RecordLineRef {
            reading,
            prev_offset,
        },
    )?;
    buf.push(b'\n');
    Ok(())
}

/// Decodes one line read from `offset`. The line may still carry its `\n`.
pub(crate) fn decode(line: &[u8], offset: u64) -> Result<LogRecord, LogError> {
    let parse_err = |reason: String| LogError::Parse { offset, reason };

    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let line = std::str::from_utf8(line).map_err(|e| parse_err(e.to_string()))?;

    let (datetime, plate_number, speed_kmph, prev_offset) = if line.starts_with('{') {
        let rec: RecordLine = serde_json::from_str(line).map_err(|e| parse_err(e.to_string()))?;
        (rec.datetime, rec.plate_number, rec.speed_kmph, rec.prev_offset)
    } else {
        decode_v1(line).map_err(parse_err)?
    };

    // Links only ever point backwards; anything else would let a walk loop.
    if prev_offset != NO_PREV && (prev_offset < 0 || prev_offset as u64 >= offset) {
        return Err(LogError::Corrupt {
            offset,
            prev_offset,
        });
    }

    let reading = Reading::from_log(datetime, plate_number, speed_kmph)
        .map_err(|e| parse_err(e.to_string()))?;

    Ok(LogRecord {
        offset,
        prev_offset,
        reading,
    })
}

fn decode_v1(line: &str) -> Result<(String, String, f64, i64), String> {
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() != V1_TOKENS {
        return Err(format!(
            "expected {} space-separated fields, found {}",
            V1_TOKENS,
            tokens.len()
        ));
    }
    let speed = tokens[4]
        .parse::<f64>()
        .map_err(|e| format!("invalid speed '{}': {}", tokens[4], e))?;
    let prev = tokens[5]
        .parse::<i64>()
        .map_err(|e| format!("invalid prev offset '{}': {}", tokens[5], e))?;
    Ok((
        format!("{} {}", tokens[0], tokens[1]),
        format!("{} {}", tokens[2], tokens[3]),
        speed,
        prev,
    ))
}
