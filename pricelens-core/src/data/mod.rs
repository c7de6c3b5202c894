//! Data loading, alignment and caching

pub mod align;
pub mod cache;
pub mod csv_io;
pub mod loader;
pub mod provider;
pub mod synthetic;

pub use align::align_quotes;
pub use cache::{CacheMeta, CacheStatus, TableCache};
pub use csv_io::{read_price_csv, read_price_csv_from, write_price_csv, write_price_csv_to};
pub use loader::{fetch_tables, MarketTables};
pub use provider::{DataError, Granularity, Quote, QuoteProvider, QuoteRange, QuoteRequest};
pub use synthetic::SyntheticProvider;
