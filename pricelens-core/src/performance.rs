//! Trailing performance per instrument over several lookback windows.
//!
//! For each instrument and window the return is measured from the earliest
//! present observation at or after the window start to the table's last row.
//! Cells that cannot be measured hold 0.0, as the summary table shows them;
//! the `status` field records why.

use crate::domain::{InstrumentId, PriceTable, TimeIndex};
use crate::window::{Lookback, WindowStart, CANONICAL_WINDOWS};
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum gap between a window's start and the first usable observation.
pub const STALENESS_TOLERANCE_DAYS: i64 = 5;

/// Why a performance cell holds the value it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellStatus {
    /// `(last - start) / start * 100`.
    Computed,
    /// First observation in the window is more than 5 days after its start.
    Stale,
    /// No observation at or after the window start.
    NoData,
    /// The start price is zero.
    ZeroStartPrice,
    /// The instrument has no observation on the table's last row.
    MissingLastPrice,
}

/// One instrument × window cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCell {
    pub value: f64,
    pub status: CellStatus,
}

impl PerformanceCell {
    fn computed(value: f64) -> Self {
        Self {
            value,
            status: CellStatus::Computed,
        }
    }

    fn zero(status: CellStatus) -> Self {
        Self { value: 0.0, status }
    }

    pub fn is_computed(&self) -> bool {
        self.status == CellStatus::Computed
    }
}

/// Cells for one instrument, one per window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub instrument: InstrumentId,
    pub cells: Vec<PerformanceCell>,
}

/// Instrument × window table of trailing returns as of `as_of`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord<T = NaiveDate> {
    /// Last timestamp of the source table; `None` for an empty table.
    pub as_of: Option<T>,
    /// Window labels, in column order.
    pub windows: Vec<String>,
    /// One row per instrument, in table column order.
    pub rows: Vec<PerformanceRow>,
}

impl<T> PerformanceRecord<T> {
    pub fn row(&self, instrument: &str) -> Option<&PerformanceRow> {
        self.rows.iter().find(|row| row.instrument == instrument)
    }

    pub fn cell(&self, instrument: &str, window: &str) -> Option<&PerformanceCell> {
        let j = self.windows.iter().position(|w| w == window)?;
        self.row(instrument).and_then(|row| row.cells.get(j))
    }

    /// Plain percentages for an instrument, in window order.
    pub fn values(&self, instrument: &str) -> Option<Vec<f64>> {
        self.row(instrument)
            .map(|row| row.cells.iter().map(|c| c.value).collect())
    }
}

/// Trailing returns for every instrument over `windows`.
///
/// Instruments are evaluated in parallel; output order follows the table.
pub fn compute_performance<T, S>(table: &PriceTable<T>, windows: &[S]) -> PerformanceRecord<T>
where
    T: TimeIndex,
    S: AsRef<str>,
{
    let labels: Vec<String> = windows.iter().map(|w| w.as_ref().to_string()).collect();
    let lookbacks: Vec<Lookback> = labels.iter().map(|l| Lookback::parse(l)).collect();

    let Some(end) = table.last_index() else {
        let rows = table
            .instruments()
            .iter()
            .map(|id| PerformanceRow {
                instrument: id.clone(),
                cells: vec![PerformanceCell::zero(CellStatus::NoData); labels.len()],
            })
            .collect();
        return PerformanceRecord {
            as_of: None,
            windows: labels,
            rows,
        };
    };

    let starts: Vec<WindowStart<T>> = lookbacks.iter().map(|lb| lb.start_from(end)).collect();
    let columns: Vec<(&str, &[Option<f64>])> = table.columns().collect();

    let rows = columns
        .into_par_iter()
        .map(|(id, cells)| PerformanceRow {
            instrument: id.to_string(),
            cells: starts
                .iter()
                .map(|start| trailing_return(table.index(), cells, *start))
                .collect(),
        })
        .collect();

    PerformanceRecord {
        as_of: Some(end),
        windows: labels,
        rows,
    }
}

/// [`compute_performance`] over the eight canonical windows.
pub fn compute_canonical<T: TimeIndex>(table: &PriceTable<T>) -> PerformanceRecord<T> {
    compute_performance(table, &CANONICAL_WINDOWS)
}

fn trailing_return<T: TimeIndex>(
    index: &[T],
    cells: &[Option<f64>],
    start: WindowStart<T>,
) -> PerformanceCell {
    let Some(last_price) = cells.last().copied().flatten() else {
        return PerformanceCell::zero(CellStatus::MissingLastPrice);
    };

    // The whole history starts at the first row.
    let Some(start) = start.date().or_else(|| index.first().copied()) else {
        return PerformanceCell::zero(CellStatus::NoData);
    };

    let from = index.partition_point(|t| *t < start);
    let closest = cells[from..]
        .iter()
        .position(Option::is_some)
        .map(|offset| from + offset);
    let Some(i) = closest else {
        return PerformanceCell::zero(CellStatus::NoData);
    };

    if index[i].since(start) > Duration::days(STALENESS_TOLERANCE_DAYS) {
        return PerformanceCell::zero(CellStatus::Stale);
    }

    match cells[i] {
        Some(start_price) if start_price != 0.0 => {
            PerformanceCell::computed((last_price - start_price) / start_price * 100.0)
        }
        _ => PerformanceCell::zero(CellStatus::ZeroStartPrice),
    }
}
