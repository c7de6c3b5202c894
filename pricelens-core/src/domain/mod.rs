//! Domain types for PriceLens

pub mod table;
pub mod time_index;

pub use table::{InstrumentId, PriceTable, TableError};
pub use time_index::TimeIndex;
