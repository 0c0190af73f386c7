//! Flight model storage and construction
//!
//! This module provides the `FlightModel` struct holding the decoded flight
//! metadata and the ordered sequence of valid fixes, and the builder that
//! assembles it while a log is being scanned.

use crate::Result;
use crate::clock::{Clock, SystemClock};
use crate::record::{self, FixRecord, HeaderRecord};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use geo::{BoundingRect, Coord, Haversine, Length, LineString, Point, Rect};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Header information of a flight; any field may be unknown
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightMetadata {
    pub pilot: Option<String>,
    pub glider: Option<String>,
    pub site: Option<String>,
    pub gps_receiver: Option<String>,
}

/// One GPS/barometric sample
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fix {
    /// UTC instant, second resolution
    pub timestamp: DateTime<Utc>,
    /// `x` is the longitude, `y` the latitude, both in decimal degrees
    pub position: Point<f64>,
    /// Barometric altitude in meters
    pub pressure_altitude: i32,
    /// GNSS altitude in meters
    pub gps_altitude: i32,
}

impl Fix {
    #[inline]
    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.position.x()
    }
}

/// Overview of a decoded flight
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightSummary {
    /// Number of valid fixes
    pub fix_count: usize,
    /// Timestamp of the first fix
    pub start: Option<DateTime<Utc>>,
    /// Timestamp of the last fix
    pub end: Option<DateTime<Utc>>,
    /// Distance along the track in meters
    pub distance_meters: f64,
}

impl FlightSummary {
    /// Time between the first and the last fix
    pub fn duration(&self) -> Option<TimeDelta> {
        Some(self.end? - self.start?)
    }
}

/// A decoded flight: metadata plus the valid fixes in file order
///
/// Only fixes flagged valid with finite coordinates are ever stored.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlightModel {
    metadata: FlightMetadata,
    fixes: Vec<Fix>,
    /// Base name of the file the flight was read from, attached by the caller
    source_name: Option<String>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl FlightModel {
    /// Decode an IGC log, dating header-less logs with the system clock
    pub fn from_igc_str(text: &str) -> Self {
        record::decode(text, &SystemClock)
    }

    /// Decode an IGC log with an explicit source for "today"
    pub fn from_igc_str_with_clock(text: &str, clock: &dyn Clock) -> Self {
        record::decode(text, clock)
    }

    /// Read and decode an IGC log
    ///
    /// Bytes that are not valid UTF-8 (logs written in Latin-1 are common) are
    /// replaced rather than rejected, so only I/O failures are errors.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_igc_str(&String::from_utf8_lossy(&bytes)))
    }

    /// Attach the base name of the source file
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    #[inline]
    pub fn metadata(&self) -> &FlightMetadata {
        &self.metadata
    }

    #[inline]
    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    #[inline]
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// File name for the converted document: `<source name>.kml`
    pub fn suggested_file_name(&self) -> String {
        format!("{}.kml", self.source_name.as_deref().unwrap_or("flight"))
    }

    /// Ordered `(latitude, longitude)` pairs, as consumed by map renderers
    pub fn lat_lon_pairs(&self) -> Vec<(f64, f64)> {
        self.fixes
            .iter()
            .map(|fix| (fix.latitude(), fix.longitude()))
            .collect()
    }

    /// The track as a line string (`x` = longitude, `y` = latitude)
    pub fn track_line(&self) -> LineString<f64> {
        self.fixes
            .iter()
            .map(|fix| Coord::from(fix.position))
            .collect()
    }

    /// Bounding box of the track in degrees, `None` without fixes
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.track_line().bounding_rect()
    }

    /// Fix count, time range and distance along the track
    pub fn summary(&self) -> FlightSummary {
        FlightSummary {
            fix_count: self.fixes.len(),
            start: self.fixes.first().map(|fix| fix.timestamp),
            end: self.fixes.last().map(|fix| fix.timestamp),
            distance_meters: Haversine.length(&self.track_line()),
        }
    }
}

/// Accumulates headers and fixes while a log is scanned
///
/// Header fields follow last-write-wins. Fixes are dated with the most recent
/// date header; before any date header they get the clock's date.
#[derive(Debug, Default)]
pub struct FlightModelBuilder {
    metadata: FlightMetadata,
    fixes: Vec<Fix>,
    flight_date: Option<NaiveDate>,
    fallback_date: Option<NaiveDate>,
}

impl FlightModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a header, overwriting any earlier value of the same field
    pub fn apply_header(&mut self, header: HeaderRecord) {
        match header {
            HeaderRecord::Date(date) => self.flight_date = Some(date),
            HeaderRecord::Pilot(pilot) => self.metadata.pilot = Some(pilot),
            HeaderRecord::Glider(glider) => self.metadata.glider = Some(glider),
            HeaderRecord::Site(site) => self.metadata.site = Some(site),
            HeaderRecord::GpsReceiver(gps) => self.metadata.gps_receiver = Some(gps),
        }
    }

    /// Append a fix if it is usable
    ///
    /// Returns `false` when the record was discarded.
    pub fn push_fix(&mut self, record: &FixRecord, clock: &dyn Clock) -> bool {
        if !record.is_usable() {
            return false;
        }

        let date = match self.flight_date {
            Some(date) => date,
            None => *self.fallback_date.get_or_insert_with(|| {
                let today = clock.today_utc();
                tracing::warn!("No date header before the first fix, assuming {today}");
                today
            }),
        };

        self.fixes.push(Fix {
            timestamp: date.and_time(record.time).and_utc(),
            position: Point::new(record.longitude, record.latitude),
            pressure_altitude: record.pressure_altitude,
            gps_altitude: record.gps_altitude,
        });
        true
    }

    /// Finalize into an immutable model
    pub fn build(self) -> FlightModel {
        FlightModel {
            metadata: self.metadata,
            fixes: self.fixes,
            source_name: None,
        }
    }
}
