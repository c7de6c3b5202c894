//! Window filter: keep the rows inside a lookback window ending at the last
//! timestamp of the table.

use crate::domain::{PriceTable, TimeIndex};
use crate::window::{Lookback, WindowStart};

/// Rows with `start <= t <= end`, where `end` is the table's last timestamp
/// and `start` is resolved from `label`. An unrecognised label keeps every
/// row.
pub fn filter_window<T: TimeIndex>(table: &PriceTable<T>, label: &str) -> PriceTable<T> {
    filter_lookback(table, Lookback::parse(label))
}

/// Same as [`filter_window`] with an already parsed lookback.
pub fn filter_lookback<T: TimeIndex>(table: &PriceTable<T>, lookback: Lookback) -> PriceTable<T> {
    let Some(end) = table.last_index() else {
        return table.clone();
    };
    match lookback.start_from(end) {
        WindowStart::From(start) => table.slice(table.lower_bound(start)..table.len()),
        WindowStart::FullHistory => table.clone(),
    }
}
