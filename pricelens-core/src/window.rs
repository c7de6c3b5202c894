//! Lookback window labels and their resolution to a start timestamp.
//!
//! Labels look like `"3 Months"`: a positive count, a space, and a unit name.
//! The unit is found by case-sensitive substring match on `Week`, `Month` or
//! `Year`, with fixed widths of 7, 30 and 365 days. Anything else resolves to
//! the whole history.

use crate::domain::TimeIndex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight lookback windows shown in the performance summary.
pub const CANONICAL_WINDOWS: [&str; 8] = [
    "1 Weeks", "2 Weeks", "1 Months", "3 Months", "6 Months", "1 Years", "2 Years", "5 Years",
];

/// Windows offered for the price view.
pub const VIEW_WINDOWS: [&str; 7] = [
    "1 Weeks", "2 Weeks", "1 Months", "3 Months", "6 Months", "1 Years", "3 Years",
];

pub const DEFAULT_VIEW_WINDOW: &str = "1 Months";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowUnit {
    Week,
    Month,
    Year,
}

impl WindowUnit {
    /// Fixed day width (not calendar-accurate).
    pub fn days(self) -> i64 {
        match self {
            WindowUnit::Week => 7,
            WindowUnit::Month => 30,
            WindowUnit::Year => 365,
        }
    }

    fn name(self) -> &'static str {
        match self {
            WindowUnit::Week => "Week",
            WindowUnit::Month => "Month",
            WindowUnit::Year => "Year",
        }
    }

    fn detect(label: &str) -> Option<Self> {
        [WindowUnit::Week, WindowUnit::Month, WindowUnit::Year]
            .into_iter()
            .find(|unit| label.contains(unit.name()))
    }
}

/// A parsed `"<count> <Unit>s"` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowLabel {
    pub count: u32,
    pub unit: WindowUnit,
}

impl WindowLabel {
    pub fn new(count: u32, unit: WindowUnit) -> Self {
        Self { count, unit }
    }

    /// Strict parse; `None` when the unit or the count is not recognised.
    pub fn parse(label: &str) -> Option<Self> {
        let unit = WindowUnit::detect(label)?;
        let count: u32 = label.split_whitespace().next()?.parse().ok()?;
        (count > 0).then_some(Self { count, unit })
    }

    /// Total width in days.
    pub fn days(&self) -> i64 {
        i64::from(self.count) * self.unit.days()
    }
}

impl fmt::Display for WindowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}s", self.count, self.unit.name())
    }
}

/// What a label means once parsed: a trailing window or the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookback {
    Trailing(WindowLabel),
    FullHistory,
}

impl Lookback {
    /// Permissive parse: unrecognised labels fall back to the whole history.
    pub fn parse(label: &str) -> Self {
        match WindowLabel::parse(label) {
            Some(window) => Lookback::Trailing(window),
            None => {
                tracing::warn!(label, "unrecognised window label, using full history");
                Lookback::FullHistory
            }
        }
    }

    /// Start of the window ending at `end`.
    pub fn start_from<T: TimeIndex>(self, end: T) -> WindowStart<T> {
        match self {
            Lookback::Trailing(window) => match end.days_before(window.days()) {
                Some(start) => WindowStart::From(start),
                None => {
                    tracing::warn!(%window, %end, "window start out of range, using full history");
                    WindowStart::FullHistory
                }
            },
            Lookback::FullHistory => WindowStart::FullHistory,
        }
    }
}

/// Resolved lower bound of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStart<T> {
    From(T),
    FullHistory,
}

impl<T: Copy> WindowStart<T> {
    /// The concrete start, if there is one.
    pub fn date(&self) -> Option<T> {
        match self {
            WindowStart::From(t) => Some(*t),
            WindowStart::FullHistory => None,
        }
    }
}

/// Resolve `label` against `end`.
pub fn resolve<T: TimeIndex>(label: &str, end: T) -> WindowStart<T> {
    Lookback::parse(label).start_from(end)
}
