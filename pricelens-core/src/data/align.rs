//! Multi-instrument time alignment.
//!
//! Given quotes for several instruments, align them to a common timeline:
//! the union of every instrument's timestamps. An instrument with no quote
//! at a timestamp gets an absent cell (no forward-fill).

use super::provider::Quote;
use crate::domain::{InstrumentId, PriceTable, TableError, TimeIndex};
use std::collections::{BTreeMap, BTreeSet};

/// Outer-join per-instrument quote series into one table.
///
/// Timestamps are converted with [`TimeIndex::from_datetime`], so a daily
/// table truncates to the date. When several quotes land on the same index
/// value, the latest one is kept. Columns follow the input order.
pub fn align_quotes<T: TimeIndex>(
    series: &[(InstrumentId, Vec<Quote>)],
) -> Result<PriceTable<T>, TableError> {
    let per_instrument: Vec<BTreeMap<T, f64>> = series
        .iter()
        .map(|(_, quotes)| {
            let mut sorted: Vec<&Quote> = quotes.iter().collect();
            sorted.sort_by_key(|q| q.timestamp);
            sorted
                .into_iter()
                .map(|q| (T::from_datetime(q.timestamp), q.close))
                .collect()
        })
        .collect();

    // Union of all timestamps
    let index: Vec<T> = per_instrument
        .iter()
        .flat_map(|m| m.keys().copied())
        .collect::<BTreeSet<T>>()
        .into_iter()
        .collect();

    let columns = per_instrument
        .iter()
        .map(|m| index.iter().map(|t| m.get(t).copied()).collect())
        .collect();
    let instruments = series.iter().map(|(id, _)| id.clone()).collect();

    PriceTable::new(index, instruments, columns)
}
