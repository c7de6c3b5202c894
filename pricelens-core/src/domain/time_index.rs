//! Time axis abstraction.
//!
//! The same pipeline runs over the daily history table (indexed by
//! `NaiveDate`) and the intraday table (indexed by `NaiveDateTime`). Window
//! arithmetic is always in whole calendar days.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::{Debug, Display};

/// A point on a price table's time axis.
pub trait TimeIndex: Copy + Ord + Debug + Display + Send + Sync + 'static {
    /// Step back by `days` calendar days. `None` if the result is out of range.
    fn days_before(self, days: i64) -> Option<Self>;

    /// Signed elapsed time from `earlier` to `self`.
    fn since(self, earlier: Self) -> Duration;

    /// Parse an index cell as written by the CSV loader or the cache.
    fn parse_index(s: &str) -> Option<Self>;

    /// Convert a provider timestamp into this index type.
    fn from_datetime(dt: NaiveDateTime) -> Self;
}

impl TimeIndex for NaiveDate {
    fn days_before(self, days: i64) -> Option<Self> {
        self.checked_sub_signed(Duration::try_days(days)?)
    }

    fn since(self, earlier: Self) -> Duration {
        self.signed_duration_since(earlier)
    }

    /// Accepts bare dates and midnight timestamps. A timestamp with a time
    /// of day is rejected rather than truncated, so intraday rows never
    /// collapse onto a daily index.
    fn parse_index(s: &str) -> Option<Self> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
            NaiveDateTime::parse_index(s)
                .filter(|dt| dt.time() == NaiveTime::MIN)
                .map(|dt| dt.date())
        })
    }

    fn from_datetime(dt: NaiveDateTime) -> Self {
        dt.date()
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];

impl TimeIndex for NaiveDateTime {
    fn days_before(self, days: i64) -> Option<Self> {
        self.checked_sub_signed(Duration::try_days(days)?)
    }

    fn since(self, earlier: Self) -> Duration {
        self.signed_duration_since(earlier)
    }

    /// Accepts naive timestamps, timestamps with a UTC offset (the offset is
    /// dropped and local wall time kept) and bare dates (midnight).
    fn parse_index(s: &str) -> Option<Self> {
        let s = s.trim();
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt);
            }
        }
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Some(dt.naive_local());
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_local());
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN))
    }

    fn from_datetime(dt: NaiveDateTime) -> Self {
        dt
    }
}
