//! Source of the current UTC date
//!
//! Fix records only carry a time of day. When a log has no date header the
//! decoder dates every fix with "today", which comes from a [`Clock`].

use chrono::{NaiveDate, Utc};

/// Provides the calendar date used when a log has no date header
pub trait Clock {
    /// Current date in UTC
    fn today_utc(&self) -> NaiveDate;
}

/// Wall clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today_utc(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a single date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today_utc(&self) -> NaiveDate {
        self.0
    }
}
