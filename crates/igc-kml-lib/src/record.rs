//! IGC record decoding
//!
//! Every IGC line starts with a single tag byte naming the record kind. This
//! module classifies lines by that byte and extracts the fixed-width fields of
//! the two kinds the converter cares about: `H` headers and `B` fixes. Lines
//! that do not fit the expected shape are skipped, never reported as errors.

use crate::clock::Clock;
use crate::coord::{Hemisphere, decode_coordinate};
use crate::flight::{FlightModel, FlightModelBuilder};
use chrono::{NaiveDate, NaiveTime};

/// Minimum length of a `B` record: tag, time, latitude, longitude, validity, altitudes
pub const FIX_RECORD_LEN: usize = 35;

/// Record kind, from the leading tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `H` - flight header
    Header,
    /// `B` - position fix
    Fix,
    /// Any other record (`A`, `I`, `L`, `G`, ...)
    Other,
}

impl RecordKind {
    #[inline]
    pub fn classify(line: &str) -> Self {
        match line.as_bytes().first() {
            Some(b'H') => Self::Header,
            Some(b'B') => Self::Fix,
            _ => Self::Other,
        }
    }
}

/// A recognized header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderRecord {
    /// `HxDTE` - flight date
    Date(NaiveDate),
    /// `HxPLT` - pilot in charge
    Pilot(String),
    /// `HxGTY` - glider type
    Glider(String),
    /// `HxSIT` - launch site
    Site(String),
    /// `HxGPS` - GPS receiver
    GpsReceiver(String),
}

impl HeaderRecord {
    /// Parse a header line
    ///
    /// The layout is `H`, one source byte (`F` for the recorder, `O` for an
    /// observer, ...), a three letter subtype and the subtype's payload.
    /// Returns `None` for unknown subtypes and malformed payloads.
    pub fn parse(line: &str) -> Option<Self> {
        let bytes = line.as_bytes();
        if bytes.len() < 5 || bytes[0] != b'H' || !bytes[1].is_ascii_alphabetic() {
            return None;
        }
        let payload = line.get(5..)?;

        match &bytes[2..5] {
            b"DTE" => parse_date(payload).map(Self::Date),
            b"PLT" => text_value(payload).map(Self::Pilot),
            b"GTY" => text_value(payload).map(Self::Glider),
            b"SIT" => text_value(payload).map(Self::Site),
            b"GPS" => text_value(payload).map(Self::GpsReceiver),
            _ => None,
        }
    }
}

/// `DDMMYY`, optionally behind the long form label (`HFDTEDATE:230724,01`)
fn parse_date(payload: &str) -> Option<NaiveDate> {
    let digits = payload.strip_prefix("DATE:").unwrap_or(payload).as_bytes();
    if digits.len() < 6 {
        return None;
    }
    let day = parse_digits(&digits[0..2])?;
    let month = parse_digits(&digits[2..4])?;
    let year = parse_digits(&digits[4..6])?;
    NaiveDate::from_ymd_opt(2000 + year as i32, month, day)
}

/// Everything after the first colon, trimmed
fn text_value(payload: &str) -> Option<String> {
    let (_, value) = payload.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A decoded `B` record
///
/// Layout (0-based byte offsets):
///
/// ```text
/// B HHMMSS DDMMmmm N DDDMMmmm E V PPPPP GGGGG
/// 0 1      7       14 15      23 24 25  30
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FixRecord {
    /// UTC time of day
    pub time: NaiveTime,
    /// Decimal degrees, south negative
    pub latitude: f64,
    /// Decimal degrees, west negative
    pub longitude: f64,
    /// `A` in the validity column; `V` and anything else is invalid
    pub valid: bool,
    /// Barometric altitude in meters
    pub pressure_altitude: i32,
    /// GNSS altitude in meters
    pub gps_altitude: i32,
}

impl FixRecord {
    /// Parse a fix line; trailing extension bytes are ignored
    pub fn parse(line: &str) -> Option<Self> {
        let b = line.as_bytes();
        if b.len() < FIX_RECORD_LEN || b[0] != b'B' {
            return None;
        }

        let time = NaiveTime::from_hms_opt(
            parse_digits(&b[1..3])?,
            parse_digits(&b[3..5])?,
            parse_digits(&b[5..7])?,
        )?;

        let lat_hemisphere = Hemisphere::from_byte(b[14])
            .filter(|h| matches!(h, Hemisphere::North | Hemisphere::South))?;
        let latitude = decode_coordinate(
            parse_digits(&b[7..9])?,
            parse_digits(&b[9..14])?,
            lat_hemisphere,
        );

        let lon_hemisphere = Hemisphere::from_byte(b[23])
            .filter(|h| matches!(h, Hemisphere::East | Hemisphere::West))?;
        let longitude = decode_coordinate(
            parse_digits(&b[15..18])?,
            parse_digits(&b[18..23])?,
            lon_hemisphere,
        );

        Some(Self {
            time,
            latitude,
            longitude,
            valid: b[24] == b'A',
            pressure_altitude: parse_altitude(&b[25..30])?,
            gps_altitude: parse_altitude(&b[30..35])?,
        })
    }

    /// Whether the fix may enter a flight model
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.valid && self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Unsigned decimal field; every byte must be an ASCII digit
#[inline]
fn parse_digits(field: &[u8]) -> Option<u32> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        field
            .iter()
            .fold(0u32, |acc, digit| acc * 10 + u32::from(digit - b'0')),
    )
}

/// Five digit altitude field in meters, zero padded
#[inline]
fn parse_altitude(field: &[u8]) -> Option<i32> {
    parse_digits(field).and_then(|value| i32::try_from(value).ok())
}

/// Decode a whole IGC log
///
/// Lines are processed in order. Headers update the metadata (last write wins),
/// fixes are dated with the most recent date header seen so far, or with
/// `clock`'s date when the log has none.
pub fn decode(text: &str, clock: &dyn Clock) -> FlightModel {
    #[cfg(feature = "profiling")]
    profiling::scope!("record::decode");

    let mut builder = FlightModelBuilder::new();
    let mut skipped: usize = 0;

    let lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty());

    for (index, line) in lines.enumerate() {
        match RecordKind::classify(line) {
            RecordKind::Header => match HeaderRecord::parse(line) {
                Some(header) => builder.apply_header(header),
                None => tracing::trace!("Ignoring header line {}: {line}", index + 1),
            },
            RecordKind::Fix => match FixRecord::parse(line) {
                Some(record) => {
                    if !builder.push_fix(&record, clock) {
                        skipped += 1;
                    }
                }
                None => {
                    tracing::trace!("Skipping malformed fix line {}: {line}", index + 1);
                    skipped += 1;
                }
            },
            RecordKind::Other => {}
        }
    }

    let model = builder.build();
    tracing::debug!(
        "Decoded {} fixes ({} fix records skipped)",
        model.fixes().len(),
        skipped
    );
    model
}
