//! Table transforms: window filter, normalization, smoothing.
//!
//! Every transform borrows its input and returns a new table with the same
//! instrument columns. The view pipeline applies them in a fixed order:
//! filter, then normalize, then smooth.

pub mod filter;
pub mod normalize;
pub mod smooth;

pub use filter::{filter_lookback, filter_window};
pub use normalize::{
    normalize_to_instrument, normalize_to_reference_point, normalize_to_value, Baseline,
    BaselinePolicy,
};
pub use smooth::smooth;

use thiserror::Error;

/// Configuration errors surfaced by transforms. Data conditions (absent
/// cells, zero baselines) never produce an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("reference instrument '{0}' is not a column of the table")]
    UnknownInstrument(String),

    #[error("smoothing window must be at least 1 row, got {0}")]
    InvalidSmoothingWindow(usize),
}
