//! View configuration: which window, normalization and smoothing to apply.
//!
//! Stored as TOML. Every field is optional in the file; missing fields take
//! the defaults below.
//!
//! ```toml
//! window = "3 Months"
//! relative = true
//! baseline = "First Week"
//! reference_instrument = "VOO"
//! smoothing_window = 5
//! instruments = ["AAPL", "MSFT", "VOO"]
//! ```

use crate::domain::{PriceTable, TimeIndex};
use crate::transform::BaselinePolicy;
use crate::window::DEFAULT_VIEW_WINDOW;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("reference instrument '{0}' is not in the price table")]
    UnknownInstrument(String),

    #[error("smoothing window must be at least 1 row, got {0}")]
    InvalidSmoothingWindow(usize),
}

/// User selections driving one render of the price view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Lookback label for the view, e.g. `"3 Months"`.
    pub window: String,
    /// Show percentage change from `baseline` instead of raw prices.
    pub relative: bool,
    pub baseline: BaselinePolicy,
    /// Subtract this instrument from every other column.
    pub reference_instrument: Option<String>,
    /// Trailing moving-average width in rows.
    pub smoothing_window: Option<usize>,
    /// Instruments to display; `None` shows every column.
    pub instruments: Option<Vec<String>>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_VIEW_WINDOW.to_string(),
            relative: true,
            baseline: BaselinePolicy::FirstDate,
            reference_instrument: None,
            smoothing_window: None,
            instruments: None,
        }
    }
}

impl ViewConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Baseline policy when relative mode is on.
    pub fn reference_point(&self) -> Option<BaselinePolicy> {
        self.relative.then_some(self.baseline)
    }

    /// Check the selections against the table they will be applied to.
    ///
    /// Unknown display instruments are not an error; they are logged and
    /// dropped at render time.
    pub fn validate<T: TimeIndex>(&self, table: &PriceTable<T>) -> Result<(), ConfigError> {
        if let Some(reference) = &self.reference_instrument {
            if table.position(reference).is_none() {
                return Err(ConfigError::UnknownInstrument(reference.clone()));
            }
        }
        if self.smoothing_window == Some(0) {
            return Err(ConfigError::InvalidSmoothingWindow(0));
        }
        if let Some(selected) = &self.instruments {
            for id in selected {
                if table.position(id).is_none() {
                    tracing::warn!(instrument = %id, "selected instrument not in table");
                }
            }
        }
        Ok(())
    }
}
