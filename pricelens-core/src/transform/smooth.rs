//! Trailing moving average over rows.
//!
//! Each output cell is the mean of the cell and the `window - 1` rows before
//! it. The first `window - 1` rows are absent, and so is any row whose window
//! contains an absent cell.

use super::TransformError;
use crate::domain::{PriceTable, TimeIndex};

pub fn smooth<T: TimeIndex>(
    table: &PriceTable<T>,
    window: usize,
) -> Result<PriceTable<T>, TransformError> {
    if window == 0 {
        return Err(TransformError::InvalidSmoothingWindow(window));
    }
    if window == 1 {
        return Ok(table.clone());
    }
    Ok(table.map_columns(|_, cells| rolling_mean(cells, window)))
}

fn rolling_mean(cells: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = cells.len();
    let mut result = vec![None; n];
    if n < window {
        return result;
    }

    // Summed per window: each cell is the mean of exactly its own rows.
    for i in (window - 1)..n {
        let sum: Option<f64> = cells[i + 1 - window..=i].iter().copied().sum();
        result[i] = sum.map(|s| s / window as f64);
    }

    result
}
