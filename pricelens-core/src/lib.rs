//! PriceLens Core — price tables, window resolution, normalization, smoothing
//! and trailing performance.
//!
//! This crate contains everything behind the price view:
//! - Time-indexed price tables (daily and intraday)
//! - Lookback window labels and their resolution to start dates
//! - Pure table transforms, applied as filter → normalize → smooth
//! - Trailing performance per instrument over several windows
//! - Display encoding for performance cells
//! - Quote loading, CSV import/export and a Parquet table cache

pub mod config;
pub mod data;
pub mod domain;
pub mod format;
pub mod performance;
pub mod pipeline;
pub mod transform;
pub mod window;

pub use config::{ConfigError, ViewConfig};
pub use domain::{InstrumentId, PriceTable, TableError, TimeIndex};
pub use performance::{compute_canonical, compute_performance, CellStatus, PerformanceRecord};
pub use pipeline::{build_dashboard, build_view, Dashboard};
pub use transform::{BaselinePolicy, TransformError};
pub use window::{Lookback, WindowLabel, WindowStart};
