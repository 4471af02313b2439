//! The four TOML date and time kinds.
//!
//! Each kind wraps the matching `chrono` type and stores at most microsecond
//! precision; anything finer is truncated on construction. The text form is the
//! fixed-width TOML grammar:
//!
//! | Kind               | Example                            |
//! |--------------------|------------------------------------|
//! | [`LocalDate`]      | `1979-05-27`                       |
//! | [`LocalTime`]      | `07:32:00.999999`                  |
//! | [`LocalDateTime`]  | `1979-05-27T07:32:00`              |
//! | [`OffsetDateTime`] | `1979-05-27T00:32:00.5-07:00`      |
//!
//! With `serde`, each kind serializes through a private newtype-struct name so
//! this crate keeps the TOML kind while other formats see a plain string.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tomlet::OffsetDateTime;
//!
//! let dt: OffsetDateTime = "1979-05-27T07:32:00Z".parse().unwrap();
//! assert_eq!(dt.to_string(), "1979-05-27T07:32:00Z");
//!
//! let json = serde_json::to_string(&dt).unwrap();
//! assert_eq!(json, "\"1979-05-27T07:32:00Z\"");
//! ```

use crate::error::{Error, ParseErrorKind, Result};
use crate::lexer::{is_digit, is_hyphen, Cursor};
use crate::TomlValue;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub(crate) const LOCAL_DATE_NAME: &str = "$__serde_tomlet_private_local_date";
pub(crate) const LOCAL_TIME_NAME: &str = "$__serde_tomlet_private_local_time";
pub(crate) const LOCAL_DATE_TIME_NAME: &str = "$__serde_tomlet_private_local_date_time";
pub(crate) const OFFSET_DATE_TIME_NAME: &str = "$__serde_tomlet_private_offset_date_time";

/// Which temporal kind a private newtype name stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TemporalKind {
    LocalDate,
    LocalTime,
    LocalDateTime,
    OffsetDateTime,
}

impl TemporalKind {
    pub(crate) fn from_newtype_name(name: &str) -> Option<Self> {
        match name {
            LOCAL_DATE_NAME => Some(TemporalKind::LocalDate),
            LOCAL_TIME_NAME => Some(TemporalKind::LocalTime),
            LOCAL_DATE_TIME_NAME => Some(TemporalKind::LocalDateTime),
            OFFSET_DATE_TIME_NAME => Some(TemporalKind::OffsetDateTime),
            _ => None,
        }
    }

    pub(crate) fn type_name(self) -> &'static str {
        match self {
            TemporalKind::LocalDate => "local date",
            TemporalKind::LocalTime => "local time",
            TemporalKind::LocalDateTime => "local date-time",
            TemporalKind::OffsetDateTime => "offset date-time",
        }
    }

    /// The kind of a value, if it is temporal.
    pub(crate) fn of(value: &TomlValue) -> Option<Self> {
        match value {
            TomlValue::LocalDate(_) => Some(TemporalKind::LocalDate),
            TomlValue::LocalTime(_) => Some(TemporalKind::LocalTime),
            TomlValue::LocalDateTime(_) => Some(TemporalKind::LocalDateTime),
            TomlValue::OffsetDateTime(_) => Some(TemporalKind::OffsetDateTime),
            _ => None,
        }
    }

    /// Parses `text` and checks that it is this kind.
    pub(crate) fn parse(self, text: &str) -> Result<TomlValue> {
        let value = parse_temporal_str(text)?;
        if TemporalKind::of(&value) == Some(self) {
            Ok(value)
        } else {
            Err(Error::type_mismatch(self.type_name(), value.type_name()))
        }
    }
}

fn truncate_time(time: NaiveTime) -> NaiveTime {
    // Leap seconds are folded into the last regular second.
    let micros = (time.nanosecond() % 1_000_000_000) / 1_000;
    NaiveTime::from_hms_micro_opt(time.hour(), time.minute(), time.second(), micros)
        .unwrap_or(time)
}

/// A calendar date without time or offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDate(NaiveDate);

/// A wall-clock time without date or offset, microsecond precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalTime(NaiveTime);

/// A date and time without offset, microsecond precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDateTime(NaiveDateTime);

/// A date and time at a fixed UTC offset, microsecond precision.
///
/// Equality compares the instant and the offset, so `07:32:00Z` and
/// `00:32:00-07:00` are different values.
#[derive(Clone, Copy, Debug)]
pub struct OffsetDateTime(DateTime<FixedOffset>);

impl PartialEq for OffsetDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.offset_seconds() == other.offset_seconds()
    }
}

impl Eq for OffsetDateTime {}

impl std::hash::Hash for OffsetDateTime {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.naive_utc().hash(state);
        self.offset_seconds().hash(state);
    }
}

impl LocalDate {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        LocalDate(date)
    }

    /// Builds a date from calendar parts, `None` if the date does not exist.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(LocalDate)
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> NaiveDate {
        self.0
    }
}

impl LocalTime {
    /// Wraps `time`, truncating to microseconds.
    #[must_use]
    pub fn new(time: NaiveTime) -> Self {
        LocalTime(truncate_time(time))
    }

    /// Builds a time from clock parts, `None` if any part is out of range.
    #[must_use]
    pub fn from_hms_micro(hour: u32, minute: u32, second: u32, micro: u32) -> Option<Self> {
        NaiveTime::from_hms_micro_opt(hour, minute, second, micro).map(LocalTime)
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> NaiveTime {
        self.0
    }
}

impl LocalDateTime {
    /// Wraps `datetime`, truncating to microseconds.
    #[must_use]
    pub fn new(datetime: NaiveDateTime) -> Self {
        LocalDateTime(NaiveDateTime::new(datetime.date(), truncate_time(datetime.time())))
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> NaiveDateTime {
        self.0
    }

    #[must_use]
    pub fn date(&self) -> LocalDate {
        LocalDate(self.0.date())
    }

    #[must_use]
    pub fn time(&self) -> LocalTime {
        LocalTime(self.0.time())
    }
}

impl OffsetDateTime {
    /// Wraps `datetime`, truncating to microseconds.
    #[must_use]
    pub fn new(datetime: DateTime<FixedOffset>) -> Self {
        let local = datetime.naive_local();
        let truncated = NaiveDateTime::new(local.date(), truncate_time(local.time()));
        let offset = *datetime.offset();
        match truncated.and_local_timezone(offset).single() {
            Some(dt) => OffsetDateTime(dt),
            None => OffsetDateTime(datetime),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> DateTime<FixedOffset> {
        self.0
    }

    /// The offset from UTC in seconds.
    #[must_use]
    pub fn offset_seconds(&self) -> i32 {
        self.0.offset().local_minus_utc()
    }
}

impl From<NaiveDate> for LocalDate {
    fn from(date: NaiveDate) -> Self {
        LocalDate::new(date)
    }
}

impl From<NaiveTime> for LocalTime {
    fn from(time: NaiveTime) -> Self {
        LocalTime::new(time)
    }
}

impl From<NaiveDateTime> for LocalDateTime {
    fn from(datetime: NaiveDateTime) -> Self {
        LocalDateTime::new(datetime)
    }
}

impl From<DateTime<FixedOffset>> for OffsetDateTime {
    fn from(datetime: DateTime<FixedOffset>) -> Self {
        OffsetDateTime::new(datetime)
    }
}

impl From<DateTime<chrono::Utc>> for OffsetDateTime {
    fn from(datetime: DateTime<chrono::Utc>) -> Self {
        OffsetDateTime::new(datetime.into())
    }
}

fn fmt_date(f: &mut fmt::Formatter<'_>, date: NaiveDate) -> fmt::Result {
    write!(f, "{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

fn fmt_time(f: &mut fmt::Formatter<'_>, time: NaiveTime) -> fmt::Result {
    // chrono keeps a leap second as second 59 plus a full extra second of nanos.
    let leap = time.nanosecond() >= 1_000_000_000;
    write!(
        f,
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        if leap { 60 } else { time.second() }
    )?;
    let micros = (time.nanosecond() % 1_000_000_000) / 1_000;
    if micros != 0 {
        let digits = format!("{:06}", micros);
        write!(f, ".{}", digits.trim_end_matches('0'))?;
    }
    Ok(())
}

fn fmt_offset(f: &mut fmt::Formatter<'_>, seconds: i32) -> fmt::Result {
    if seconds == 0 {
        return f.write_str("Z");
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    write!(f, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_date(f, self.0)
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_time(f, self.0)
    }
}

impl fmt::Display for LocalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_date(f, self.0.date())?;
        f.write_str("T")?;
        fmt_time(f, self.0.time())
    }
}

impl fmt::Display for OffsetDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = self.0.naive_local();
        fmt_date(f, local.date())?;
        f.write_str("T")?;
        fmt_time(f, local.time())?;
        fmt_offset(f, self.offset_seconds())
    }
}

/// Whether the cursor sits on something shaped like a date (`DDDD-`) or a time (`DD:`).
pub(crate) fn looks_temporal(cursor: &Cursor<'_>) -> bool {
    let digit = |i| cursor.peek_at(i).map_or(false, is_digit);
    if digit(0) && digit(1) {
        if cursor.peek_at(2) == Some(b':') {
            return true;
        }
        return digit(2) && digit(3) && cursor.peek_at(4).map_or(false, is_hyphen);
    }
    false
}

fn fixed_digits(cursor: &mut Cursor<'_>, count: usize) -> Result<u32> {
    let mut acc = 0u32;
    for _ in 0..count {
        match cursor.peek() {
            Some(b) if is_digit(b) => {
                acc = acc * 10 + u32::from(b - b'0');
                cursor.advance();
            }
            _ => return Err(cursor.error(ParseErrorKind::InvalidDateTime)),
        }
    }
    Ok(acc)
}

fn expect_byte(cursor: &mut Cursor<'_>, expected: u8) -> Result<()> {
    if cursor.eat(expected) {
        Ok(())
    } else {
        Err(cursor.error(ParseErrorKind::InvalidDateTime))
    }
}

fn scan_date(cursor: &mut Cursor<'_>) -> Result<NaiveDate> {
    let start = cursor.pos();
    let year = fixed_digits(cursor, 4)?;
    expect_byte(cursor, b'-')?;
    let month = fixed_digits(cursor, 2)?;
    expect_byte(cursor, b'-')?;
    let day = fixed_digits(cursor, 2)?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| cursor.error_at(start, ParseErrorKind::InvalidDateTime))
}

fn scan_time(cursor: &mut Cursor<'_>) -> Result<NaiveTime> {
    let start = cursor.pos();
    let hour = fixed_digits(cursor, 2)?;
    expect_byte(cursor, b':')?;
    let minute = fixed_digits(cursor, 2)?;
    expect_byte(cursor, b':')?;
    let second = fixed_digits(cursor, 2)?;

    let mut micros = 0u32;
    if cursor.eat(b'.') {
        let mut count = 0;
        while let Some(b) = cursor.peek().filter(|&b| is_digit(b)) {
            if count < 6 {
                micros = micros * 10 + u32::from(b - b'0');
            }
            count += 1;
            cursor.advance();
        }
        if count == 0 {
            return Err(cursor.error(ParseErrorKind::InvalidDateTime));
        }
        for _ in count..6 {
            micros *= 10;
        }
    }

    let (second, micros) = if second == 60 {
        (59, micros + 1_000_000)
    } else {
        (second, micros)
    };
    NaiveTime::from_hms_micro_opt(hour, minute, second, micros)
        .ok_or_else(|| cursor.error_at(start, ParseErrorKind::InvalidDateTime))
}

fn scan_offset(cursor: &mut Cursor<'_>) -> Result<Option<FixedOffset>> {
    let start = cursor.pos();
    let sign = match cursor.peek() {
        Some(b'Z' | b'z') => {
            cursor.advance();
            return Ok(FixedOffset::east_opt(0));
        }
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return Ok(None),
    };
    cursor.advance();
    let hours = fixed_digits(cursor, 2)?;
    expect_byte(cursor, b':')?;
    let minutes = fixed_digits(cursor, 2)?;
    if hours > 23 || minutes > 59 {
        return Err(cursor.error_at(start, ParseErrorKind::InvalidDateTime));
    }
    let seconds = sign * (hours * 3600 + minutes * 60) as i32;
    FixedOffset::east_opt(seconds)
        .map(Some)
        .ok_or_else(|| cursor.error_at(start, ParseErrorKind::InvalidDateTime))
}

/// Scans one date, time, date-time or offset date-time at the cursor.
pub(crate) fn scan_temporal(cursor: &mut Cursor<'_>) -> Result<TomlValue> {
    if cursor.peek_at(2) == Some(b':') {
        return Ok(TomlValue::LocalTime(LocalTime(scan_time(cursor)?)));
    }

    let date = scan_date(cursor)?;
    let has_time = match cursor.peek() {
        Some(b'T' | b't') => true,
        // A space only separates date and time when a time follows.
        Some(b' ') => {
            cursor.peek_at(1).map_or(false, is_digit)
                && cursor.peek_at(2).map_or(false, is_digit)
                && cursor.peek_at(3) == Some(b':')
        }
        _ => false,
    };
    if !has_time {
        return Ok(TomlValue::LocalDate(LocalDate(date)));
    }
    cursor.advance();

    let time = scan_time(cursor)?;
    let local = NaiveDateTime::new(date, time);
    let start = cursor.pos();
    match scan_offset(cursor)? {
        None => Ok(TomlValue::LocalDateTime(LocalDateTime(local))),
        Some(offset) => match local.and_local_timezone(offset).single() {
            Some(dt) => Ok(TomlValue::OffsetDateTime(OffsetDateTime(dt))),
            None => Err(cursor.error_at(start, ParseErrorKind::InvalidDateTime)),
        },
    }
}

fn parse_temporal_str(text: &str) -> Result<TomlValue> {
    let mut cursor = Cursor::new(text.as_bytes());
    if !looks_temporal(&cursor) {
        return Err(cursor.error(ParseErrorKind::InvalidDateTime));
    }
    let value = scan_temporal(&mut cursor)?;
    if !cursor.at_end() {
        return Err(cursor.error(ParseErrorKind::InvalidDateTime));
    }
    Ok(value)
}

macro_rules! temporal_impls {
    ($ty:ident, $name:ident, $expecting:literal) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match TemporalKind::$ty.parse(s)? {
                    TomlValue::$ty(value) => Ok(value),
                    other => Err(Error::type_mismatch($expecting, other.type_name())),
                }
            }
        }

        impl From<$ty> for TomlValue {
            fn from(value: $ty) -> Self {
                TomlValue::$ty(value)
            }
        }

        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_newtype_struct($name, &self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                struct TemporalVisitor;

                impl<'de> Visitor<'de> for TemporalVisitor {
                    type Value = $ty;

                    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                        formatter.write_str($expecting)
                    }

                    fn visit_str<E>(self, value: &str) -> std::result::Result<$ty, E>
                    where
                        E: de::Error,
                    {
                        value.parse().map_err(E::custom)
                    }

                    fn visit_newtype_struct<D>(
                        self,
                        deserializer: D,
                    ) -> std::result::Result<$ty, D::Error>
                    where
                        D: Deserializer<'de>,
                    {
                        let text = String::deserialize(deserializer)?;
                        text.parse().map_err(de::Error::custom)
                    }
                }

                deserializer.deserialize_newtype_struct($name, TemporalVisitor)
            }
        }
    };
}

temporal_impls!(LocalDate, LOCAL_DATE_NAME, "a TOML local date");
temporal_impls!(LocalTime, LOCAL_TIME_NAME, "a TOML local time");
temporal_impls!(LocalDateTime, LOCAL_DATE_TIME_NAME, "a TOML local date-time");
temporal_impls!(OffsetDateTime, OFFSET_DATE_TIME_NAME, "a TOML offset date-time");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_digits() {
        let t: LocalTime = "07:32:00.5".parse().unwrap();
        assert_eq!(t.to_string(), "07:32:00.5");
        let t: LocalTime = "07:32:00.000500".parse().unwrap();
        assert_eq!(t.to_string(), "07:32:00.0005");
        let t: LocalTime = "07:32:00.000".parse().unwrap();
        assert_eq!(t.to_string(), "07:32:00");
    }

    #[test]
    fn test_fraction_truncated_to_micros() {
        let t: LocalTime = "00:00:01.123456789".parse().unwrap();
        assert_eq!(t.get().nanosecond(), 123_456_000);
        assert_eq!(t.to_string(), "00:00:01.123456");
    }

    #[test]
    fn test_leap_second() {
        let t: LocalTime = "23:59:60".parse().unwrap();
        assert_eq!(t.get().second(), 59);
        assert_eq!(t.to_string(), "23:59:60");
        let t: LocalTime = "23:59:60.25".parse().unwrap();
        assert_eq!(t.to_string(), "23:59:60.25");
        let dt: LocalDateTime = "2016-12-31T23:59:60".parse().unwrap();
        assert_eq!(dt.to_string(), "2016-12-31T23:59:60");
        assert!("23:59:61".parse::<LocalTime>().is_err());
    }

    #[test]
    fn test_offsets() {
        let dt: OffsetDateTime = "1979-05-27T00:32:00-07:00".parse().unwrap();
        assert_eq!(dt.offset_seconds(), -7 * 3600);
        assert_eq!(dt.to_string(), "1979-05-27T00:32:00-07:00");

        let dt: OffsetDateTime = "1979-05-27 07:32:00z".parse().unwrap();
        assert_eq!(dt.to_string(), "1979-05-27T07:32:00Z");
    }

    #[test]
    fn test_kind_mismatch() {
        assert!("1979-05-27".parse::<LocalDateTime>().is_err());
        assert!("07:32:00".parse::<LocalDate>().is_err());
        assert!("1979-05-27T07:32:00".parse::<LocalDateTime>().is_ok());
    }

    #[test]
    fn test_offset_is_part_of_equality() {
        let utc: OffsetDateTime = "1979-05-27T07:32:00Z".parse().unwrap();
        let shifted: OffsetDateTime = "1979-05-27T00:32:00-07:00".parse().unwrap();
        assert_eq!(utc.get(), shifted.get());
        assert_ne!(utc, shifted);
    }

    #[test]
    fn test_calendar_validation() {
        assert!("2023-02-29".parse::<LocalDate>().is_err());
        assert!("2024-02-29".parse::<LocalDate>().is_ok());
        assert!("24:00:00".parse::<LocalTime>().is_err());
        assert!("1979-05-27T07:32:00+24:00".parse::<OffsetDateTime>().is_err());
    }

    #[test]
    fn test_truncation_on_construction() {
        let time = NaiveTime::from_hms_nano_opt(1, 2, 3, 987_654_321).unwrap();
        assert_eq!(LocalTime::new(time).get().nanosecond(), 987_654_000);
    }

    #[test]
    fn test_plain_string_in_other_formats() {
        let date = LocalDate::from_ymd(2024, 1, 31).unwrap();
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-01-31\"");
        let back: LocalDate = serde_json::from_str("\"2024-01-31\"").unwrap();
        assert_eq!(back, date);
    }
}
