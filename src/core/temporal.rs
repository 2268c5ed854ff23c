//! Purpose: Convert civil date/time text to and from epoch-based column encodings.
//! Exports: `Int96Timestamp`, `TemporalParseError`, date/time/timestamp encode+decode fns.
//! Role: Leaf codec used by `value` for Date, Time and Timestamp columns (INT64 and INT96).
//! Invariants: All arithmetic is UTC; Julian days are midnight-referenced (`OFFSET_JULIAN`).
//! Invariants: Each encoder is an ordered fallback chain ending in a raw-integer parse.
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Julian day number of 1970-01-01, counted from midnight.
pub const OFFSET_JULIAN: i64 = 2_440_588;

const SECONDS_PER_DAY: i64 = 86_400;
const MICROS_PER_SECOND: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const MILLIS_PER_DAY: i64 = SECONDS_PER_DAY * 1_000;
const MICROS_PER_DAY: i64 = SECONDS_PER_DAY * MICROS_PER_SECOND;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]");
const CLOCK_MILLIS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond digits:3]");
const CLOCK_MICROS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond digits:6]");
const DATE_TIME: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);
const DATE_TIME_T: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);
const DATE_TIME_OUT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE_TIME_MILLIS_OUT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
);
const DATE_TIME_MICROS_OUT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
);

/// Zone tokens accepted (and ignored, all input is UTC) ahead of a timestamp.
const ZONE_PREFIXES: [&str; 3] = ["UTC ", "GMT ", "Z "];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemporalParseError {
    #[error("not a date (yyyy-MM-dd, yyyyMMdd or day count): `{0}`")]
    Date(String),
    #[error("not a time of day (HH:mm:ss[.fraction] or integer): `{0}`")]
    Time(String),
    #[error("not a timestamp (yyyy-MM-dd HH:mm:ss[.fraction] or epoch micros): `{0}`")]
    Timestamp(String),
    #[error("value {0} is outside the representable calendar range")]
    OutOfRange(i64),
}

/// Timestamp in the Parquet INT96 layout: Julian day plus nanoseconds since that midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Int96Timestamp {
    pub julian_day: i32,
    pub nanos_of_day: i64,
}

impl Int96Timestamp {
    pub fn from_epoch_micros(micros: i64) -> Self {
        let unix_secs = micros.div_euclid(MICROS_PER_SECOND);
        let shifted = unix_secs + OFFSET_JULIAN * SECONDS_PER_DAY;
        let julian_day = shifted.div_euclid(SECONDS_PER_DAY) as i32;
        let nanos_of_day = shifted.rem_euclid(SECONDS_PER_DAY) * NANOS_PER_SECOND
            + micros.rem_euclid(MICROS_PER_SECOND) * 1_000;
        Self {
            julian_day,
            nanos_of_day,
        }
    }

    pub fn epoch_seconds(&self) -> i64 {
        (i64::from(self.julian_day) - OFFSET_JULIAN) * SECONDS_PER_DAY
            + self.nanos_of_day.div_euclid(NANOS_PER_SECOND)
    }

    /// Parquet INT96 words: low nanos, high nanos, Julian day.
    pub fn to_words(&self) -> [u32; 3] {
        let nanos = self.nanos_of_day as u64;
        [nanos as u32, (nanos >> 32) as u32, self.julian_day as u32]
    }

    pub fn from_words(words: [u32; 3]) -> Self {
        let nanos = (u64::from(words[1]) << 32) | u64::from(words[0]);
        Self {
            julian_day: words[2] as i32,
            nanos_of_day: nanos as i64,
        }
    }

    /// The 12 raw bytes as stored on disk: nanos little-endian, then day little-endian.
    pub fn to_le_bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        out[..8].copy_from_slice(&self.nanos_of_day.to_le_bytes());
        out[8..].copy_from_slice(&self.julian_day.to_le_bytes());
        out
    }

    pub fn from_le_bytes(bytes: [u8; 12]) -> Self {
        let mut nanos = [0u8; 8];
        nanos.copy_from_slice(&bytes[..8]);
        let mut day = [0u8; 4];
        day.copy_from_slice(&bytes[8..]);
        Self {
            julian_day: i32::from_le_bytes(day),
            nanos_of_day: i64::from_le_bytes(nanos),
        }
    }
}

/// Days since 1970-01-01 from `yyyy-MM-dd`, `yyyyMMdd`, or a raw day count.
pub fn encode_date(text: &str) -> Result<i32, TemporalParseError> {
    let text = text.trim();
    parse_iso_date(text)
        .or_else(|| parse_compact_date(text))
        .map(days_since_epoch)
        .or_else(|| text.parse::<i32>().ok())
        .ok_or_else(|| TemporalParseError::Date(text.to_string()))
}

pub fn decode_date(days: i32) -> Result<String, TemporalParseError> {
    let julian = i64::from(days) + OFFSET_JULIAN;
    let date = i32::try_from(julian)
        .ok()
        .and_then(|julian| Date::from_julian_day(julian).ok())
        .ok_or(TemporalParseError::OutOfRange(i64::from(days)))?;
    date.format(ISO_DATE)
        .map_err(|_| TemporalParseError::OutOfRange(i64::from(days)))
}

/// Milliseconds since midnight; fraction digits beyond millis are truncated.
pub fn encode_time_millis(text: &str) -> Result<i32, TemporalParseError> {
    let text = text.trim();
    match parse_clock(text) {
        Some(nanos) => Ok((nanos / 1_000_000) as i32),
        None => text
            .parse::<i32>()
            .map_err(|_| TemporalParseError::Time(text.to_string())),
    }
}

/// Microseconds since midnight; fraction digits beyond micros are truncated.
pub fn encode_time_micros(text: &str) -> Result<i64, TemporalParseError> {
    let text = text.trim();
    match parse_clock(text) {
        Some(nanos) => Ok(nanos / 1_000),
        None => text
            .parse::<i64>()
            .map_err(|_| TemporalParseError::Time(text.to_string())),
    }
}

/// `HH:mm:ss.SSS`; values outside one day wrap.
pub fn decode_time_millis(millis: i32) -> Result<String, TemporalParseError> {
    let nanos = i64::from(millis).rem_euclid(MILLIS_PER_DAY) * 1_000_000;
    format_clock(nanos, CLOCK_MILLIS).ok_or(TemporalParseError::OutOfRange(i64::from(millis)))
}

/// `HH:mm:ss.ffffff`; values outside one day wrap.
pub fn decode_time_micros(micros: i64) -> Result<String, TemporalParseError> {
    let nanos = micros.rem_euclid(MICROS_PER_DAY) * 1_000;
    format_clock(nanos, CLOCK_MICROS).ok_or(TemporalParseError::OutOfRange(micros))
}

/// `[UTC|GMT|Z ]yyyy-MM-dd HH:mm:ss[.fraction]`, else raw epoch microseconds.
pub fn encode_timestamp(text: &str) -> Result<Int96Timestamp, TemporalParseError> {
    let text = text.trim();
    parse_civil_micros(text)
        .or_else(|| text.parse::<i64>().ok())
        .map(Int96Timestamp::from_epoch_micros)
        .ok_or_else(|| TemporalParseError::Timestamp(text.to_string()))
}

/// `yyyy-MM-dd HH:mm:ss`; sub-second nanos are not rendered.
pub fn decode_timestamp(ts: Int96Timestamp) -> Result<String, TemporalParseError> {
    let secs = ts.epoch_seconds();
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|dt| dt.format(DATE_TIME_OUT).ok())
        .ok_or(TemporalParseError::OutOfRange(secs))
}

/// Epoch milliseconds for INT64 `TIMESTAMP_MILLIS`; extra fraction digits are truncated.
pub fn encode_timestamp_millis(text: &str) -> Result<i64, TemporalParseError> {
    let text = text.trim();
    parse_civil_micros(text)
        .map(|micros| micros.div_euclid(1_000))
        .or_else(|| text.parse::<i64>().ok())
        .ok_or_else(|| TemporalParseError::Timestamp(text.to_string()))
}

/// Epoch microseconds for INT64 `TIMESTAMP_MICROS`.
pub fn encode_timestamp_micros(text: &str) -> Result<i64, TemporalParseError> {
    let text = text.trim();
    parse_civil_micros(text)
        .or_else(|| text.parse::<i64>().ok())
        .ok_or_else(|| TemporalParseError::Timestamp(text.to_string()))
}

/// `yyyy-MM-dd HH:mm:ss.SSS`
pub fn decode_timestamp_millis(millis: i64) -> Result<String, TemporalParseError> {
    format_epoch_nanos(i128::from(millis) * 1_000_000, DATE_TIME_MILLIS_OUT)
        .ok_or(TemporalParseError::OutOfRange(millis))
}

/// `yyyy-MM-dd HH:mm:ss.ffffff`
pub fn decode_timestamp_micros(micros: i64) -> Result<String, TemporalParseError> {
    format_epoch_nanos(i128::from(micros) * 1_000, DATE_TIME_MICROS_OUT)
        .ok_or(TemporalParseError::OutOfRange(micros))
}

fn format_epoch_nanos(nanos: i128, format: &[BorrowedFormatItem<'_>]) -> Option<String> {
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()?
        .format(format)
        .ok()
}

fn parse_iso_date(text: &str) -> Option<Date> {
    Date::parse(text, ISO_DATE).ok()
}

fn parse_compact_date(text: &str) -> Option<Date> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = text[..4].parse::<i32>().ok()?;
    let month = Month::try_from(text[4..6].parse::<u8>().ok()?).ok()?;
    let day = text[6..].parse::<u8>().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn days_since_epoch(date: Date) -> i32 {
    (i64::from(date.to_julian_day()) - OFFSET_JULIAN) as i32
}

fn parse_clock(text: &str) -> Option<i64> {
    let time = Time::parse(text, CLOCK).ok()?;
    let (hour, minute, second, nanos) = time.as_hms_nano();
    let seconds = i64::from(hour) * 3_600 + i64::from(minute) * 60 + i64::from(second);
    Some(seconds * NANOS_PER_SECOND + i64::from(nanos))
}

fn format_clock(nanos_of_day: i64, format: &[BorrowedFormatItem<'_>]) -> Option<String> {
    let seconds = nanos_of_day / NANOS_PER_SECOND;
    let time = Time::from_hms_nano(
        (seconds / 3_600) as u8,
        ((seconds / 60) % 60) as u8,
        (seconds % 60) as u8,
        (nanos_of_day % NANOS_PER_SECOND) as u32,
    )
    .ok()?;
    time.format(format).ok()
}

fn parse_civil_micros(text: &str) -> Option<i64> {
    let body = ZONE_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .map(str::trim_start)
        .unwrap_or(text);
    let civil = PrimitiveDateTime::parse(body, DATE_TIME)
        .or_else(|_| PrimitiveDateTime::parse(body, DATE_TIME_T))
        .ok()?;
    let nanos = civil.assume_utc().unix_timestamp_nanos();
    i64::try_from(nanos.div_euclid(1_000)).ok()
}

#[cfg(test)]
mod tests {
    use super::{
        Int96Timestamp, OFFSET_JULIAN, TemporalParseError, decode_date, decode_time_micros,
        decode_time_millis, decode_timestamp, decode_timestamp_micros, decode_timestamp_millis,
        encode_date, encode_time_micros, encode_time_millis, encode_timestamp,
        encode_timestamp_micros, encode_timestamp_millis,
    };

    #[test]
    fn timestamp_round_trips_whole_seconds() {
        for text in [
            "2017-01-02 00:13:45",
            "1970-01-01 00:00:00",
            "1969-12-31 23:59:59",
            "2038-01-19 03:14:08",
        ] {
            let ts = encode_timestamp(text).expect("encode");
            assert_eq!(decode_timestamp(ts).expect("decode"), text);
        }
    }

    #[test]
    fn timestamp_epoch_is_offset_julian_midnight() {
        let ts = encode_timestamp("1970-01-01 00:00:00").expect("encode");
        assert_eq!(i64::from(ts.julian_day), OFFSET_JULIAN);
        assert_eq!(ts.nanos_of_day, 0);
    }

    #[test]
    fn timestamp_accepts_zone_prefix_and_fraction() {
        let ts = encode_timestamp("GMT 2017-01-02 00:13:45.250").expect("encode");
        assert_eq!(ts.nanos_of_day, (13 * 60 + 45) * 1_000_000_000 + 250_000_000);
        assert_eq!(decode_timestamp(ts).expect("decode"), "2017-01-02 00:13:45");
    }

    #[test]
    fn timestamp_falls_back_to_epoch_micros() {
        let ts = encode_timestamp("1500000").expect("encode");
        assert_eq!(ts.julian_day as i64, OFFSET_JULIAN);
        assert_eq!(ts.nanos_of_day, 1_500_000_000);
        assert_eq!(ts.epoch_seconds(), 1);
    }

    #[test]
    fn timestamp_before_epoch_uses_floor_division() {
        let ts = Int96Timestamp::from_epoch_micros(-1);
        assert_eq!(i64::from(ts.julian_day), OFFSET_JULIAN - 1);
        assert_eq!(ts.nanos_of_day, 86_399_999_999_000);
        assert_eq!(ts.epoch_seconds(), -1);
    }

    #[test]
    fn int64_timestamps_parse_civil_text_and_render_their_unit() {
        let millis = encode_timestamp_millis("2017-01-02 00:13:45.123456").expect("millis");
        assert_eq!(millis, 1_483_316_025_123);
        assert_eq!(
            decode_timestamp_millis(millis).expect("render"),
            "2017-01-02 00:13:45.123"
        );
        let micros = encode_timestamp_micros("UTC 2017-01-02T00:13:45.123456").expect("micros");
        assert_eq!(micros, 1_483_316_025_123_456);
        assert_eq!(
            decode_timestamp_micros(micros).expect("render"),
            "2017-01-02 00:13:45.123456"
        );
        assert_eq!(decode_timestamp_millis(-1).expect("render"), "1969-12-31 23:59:59.999");
    }

    #[test]
    fn int64_timestamps_fall_back_to_raw_integers() {
        assert_eq!(encode_timestamp_millis("1500").unwrap(), 1_500);
        assert_eq!(encode_timestamp_micros("-42").unwrap(), -42);
        assert!(matches!(
            encode_timestamp_millis("tomorrow"),
            Err(TemporalParseError::Timestamp(_))
        ));
    }

    #[test]
    fn timestamp_rejects_garbage() {
        assert!(matches!(
            encode_timestamp("yesterday"),
            Err(TemporalParseError::Timestamp(_))
        ));
    }

    #[test]
    fn int96_byte_and_word_layouts_agree() {
        let ts = encode_timestamp("2017-01-02 00:13:45").expect("encode");
        assert_eq!(Int96Timestamp::from_le_bytes(ts.to_le_bytes()), ts);
        assert_eq!(Int96Timestamp::from_words(ts.to_words()), ts);
        let bytes = ts.to_le_bytes();
        let words = ts.to_words();
        assert_eq!(u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]), words[2]);
    }

    #[test]
    fn time_millis_formats() {
        for (input, expected) in [
            ("00:00:05.123", "00:00:05.123"),
            ("00:13:45.123", "00:13:45.123"),
            ("00:00:05", "00:00:05.000"),
            ("23:59:59.5", "23:59:59.500"),
        ] {
            let millis = encode_time_millis(input).expect("encode");
            assert_eq!(decode_time_millis(millis).expect("decode"), expected);
        }
        assert_eq!(encode_time_millis("00:00:05.123").unwrap(), 5_123);
        assert_eq!(encode_time_millis("42").unwrap(), 42);
    }

    #[test]
    fn time_micros_keeps_fraction() {
        let micros = encode_time_micros("01:00:00.000250").expect("encode");
        assert_eq!(micros, 3_600_000_250);
        assert_eq!(decode_time_micros(micros).unwrap(), "01:00:00.000250");
    }

    #[test]
    fn time_decode_wraps_past_midnight() {
        assert_eq!(decode_time_millis(86_400_000 + 1).unwrap(), "00:00:00.001");
        assert_eq!(decode_time_millis(-1).unwrap(), "23:59:59.999");
    }

    #[test]
    fn time_rejects_garbage() {
        assert!(matches!(encode_time_millis("noon"), Err(TemporalParseError::Time(_))));
    }

    #[test]
    fn date_accepts_three_forms() {
        assert_eq!(encode_date("1970-01-02").unwrap(), 1);
        assert_eq!(encode_date("19700102").unwrap(), 1);
        assert_eq!(encode_date("1").unwrap(), 1);
        assert_eq!(encode_date("1969-12-31").unwrap(), -1);
    }

    #[test]
    fn date_round_trips() {
        assert_eq!(decode_date(encode_date("2017-05-02").unwrap()).unwrap(), "2017-05-02");
        assert_eq!(decode_date(encode_date("20170102").unwrap()).unwrap(), "2017-01-02");
        assert_eq!(decode_date(1).unwrap(), "1970-01-02");
    }

    #[test]
    fn date_rejects_garbage_and_out_of_range() {
        assert!(matches!(encode_date("2017/05/02"), Err(TemporalParseError::Date(_))));
        assert!(matches!(decode_date(i32::MAX), Err(TemporalParseError::OutOfRange(_))));
    }
}
