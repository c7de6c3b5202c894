//! Display encoding for performance cells.
//!
//! Text is `"{value:.2}%"`. Background intensity grows linearly with
//! `|value|` and saturates at 20%, mapped onto 0–255. Renderers pick the hue
//! from the sign.

use crate::performance::{PerformanceCell, PerformanceRecord};
use serde::Serialize;

/// `|value|` at which intensity saturates.
pub const INTENSITY_CAP: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    Gain,
    Loss,
    Flat,
}

/// A performance cell ready for any renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedCell {
    pub text: String,
    pub intensity: u8,
    pub tone: Tone,
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// `round(min(|value|, 20) / 20 * 255)`; non-finite values map to 0.
pub fn intensity(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    let scaled = value.abs().min(INTENSITY_CAP) / INTENSITY_CAP * 255.0;
    scaled.round() as u8
}

pub fn tone(value: f64) -> Tone {
    if value > 0.0 {
        Tone::Gain
    } else if value < 0.0 {
        Tone::Loss
    } else {
        Tone::Flat
    }
}

pub fn format_cell(cell: &PerformanceCell) -> FormattedCell {
    FormattedCell {
        text: format_percent(cell.value),
        intensity: intensity(cell.value),
        tone: tone(cell.value),
    }
}

/// Formatted rows `(instrument, cells)` in record order.
pub fn format_record<T>(record: &PerformanceRecord<T>) -> Vec<(String, Vec<FormattedCell>)> {
    record
        .rows
        .iter()
        .map(|row| {
            (
                row.instrument.clone(),
                row.cells.iter().map(format_cell).collect(),
            )
        })
        .collect()
}
