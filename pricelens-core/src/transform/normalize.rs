//! Normalization to a reference point or to a reference instrument.
//!
//! Reference-point normalization turns prices into percentage change from a
//! per-instrument baseline: `(value / v0 - 1) * 100`. A baseline that is zero
//! or absent leaves the whole column undefined (absent) rather than letting
//! inf/NaN reach smoothing or display.
//!
//! Reference-instrument normalization subtracts one column from every other
//! one. When both are requested, the view applies reference-point
//! normalization first so the subtraction happens on the percentage scale.

use super::TransformError;
use crate::domain::{InstrumentId, PriceTable, TimeIndex};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the baseline row is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaselinePolicy {
    /// First row of the table.
    #[serde(rename = "First Date")]
    FirstDate,
    /// Mean of the rows within 7 days of the first row.
    #[serde(rename = "First Week")]
    FirstWeek,
}

impl BaselinePolicy {
    pub fn label(self) -> &'static str {
        match self {
            BaselinePolicy::FirstDate => "First Date",
            BaselinePolicy::FirstWeek => "First Week",
        }
    }
}

impl fmt::Display for BaselinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BaselinePolicy {
    type Err = String;

    /// Accepts the display tokens and their kebab-case forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "First Date" | "first-date" => Ok(BaselinePolicy::FirstDate),
            "First Week" | "first-week" => Ok(BaselinePolicy::FirstWeek),
            other => Err(format!(
                "unknown baseline '{other}' (expected 'First Date' or 'First Week')"
            )),
        }
    }
}

/// Per-instrument baseline values, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    values: Vec<(InstrumentId, Option<f64>)>,
}

impl Baseline {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (InstrumentId, Option<f64>)>,
    {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Baseline chosen by `policy` from `table`.
    pub fn from_policy<T: TimeIndex>(table: &PriceTable<T>, policy: BaselinePolicy) -> Self {
        match policy {
            BaselinePolicy::FirstDate => Self::first_row(table),
            BaselinePolicy::FirstWeek => Self::first_week(table),
        }
    }

    /// The first row as-is. Absent cells stay absent.
    pub fn first_row<T: TimeIndex>(table: &PriceTable<T>) -> Self {
        Self::from_values(
            table
                .columns()
                .map(|(id, cells)| (id.to_string(), cells.first().copied().flatten())),
        )
    }

    /// Mean of present values in the rows less than 7 days after the first
    /// row.
    pub fn first_week<T: TimeIndex>(table: &PriceTable<T>) -> Self {
        let rows = match table.first_index() {
            Some(first) => table
                .index()
                .iter()
                .take_while(|t| t.since(first) < Duration::days(7))
                .count(),
            None => 0,
        };
        Self::from_values(table.columns().map(|(id, cells)| {
            let present: Vec<f64> = cells[..rows].iter().flatten().copied().collect();
            let mean = (!present.is_empty())
                .then(|| present.iter().sum::<f64>() / present.len() as f64);
            (id.to_string(), mean)
        }))
    }

    pub fn get(&self, instrument: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(id, _)| id == instrument)
            .and_then(|(_, v)| *v)
    }
}

/// Percentage change of every cell from its instrument's baseline.
pub fn normalize_to_value<T: TimeIndex>(
    table: &PriceTable<T>,
    baseline: &Baseline,
) -> PriceTable<T> {
    table.map_columns(|id, cells| match baseline.get(id).filter(|v0| *v0 != 0.0) {
        Some(v0) => cells
            .iter()
            .map(|cell| cell.map(|v| (v / v0 - 1.0) * 100.0))
            .collect(),
        None => {
            if !cells.is_empty() {
                tracing::warn!(
                    instrument = id,
                    "baseline is zero or missing, column left undefined"
                );
            }
            vec![None; cells.len()]
        }
    })
}

/// [`normalize_to_value`] with a baseline chosen by `policy`.
pub fn normalize_to_reference_point<T: TimeIndex>(
    table: &PriceTable<T>,
    policy: BaselinePolicy,
) -> PriceTable<T> {
    normalize_to_value(table, &Baseline::from_policy(table, policy))
}

/// Express every column as its difference from `reference`.
///
/// The reference column becomes 0 on every row. Other cells are absent
/// wherever either side is absent.
pub fn normalize_to_instrument<T: TimeIndex>(
    table: &PriceTable<T>,
    reference: &str,
) -> Result<PriceTable<T>, TransformError> {
    let reference_cells = table
        .column(reference)
        .ok_or_else(|| TransformError::UnknownInstrument(reference.to_string()))?;

    Ok(table.map_columns(|id, cells| {
        if id == reference {
            return vec![Some(0.0); cells.len()];
        }
        cells
            .iter()
            .zip(reference_cells)
            .map(|(value, base)| Some((*value)? - (*base)?))
            .collect()
    }))
}
