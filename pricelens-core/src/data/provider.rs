//! Quote provider trait and structured error types.
//!
//! The QuoteProvider trait abstracts over quote sources so the table loaders
//! can run against a live feed, a synthetic generator, or a test double.

use crate::domain::TableError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no quotes returned for {symbol}")]
    EmptyResponse { symbol: String },

    #[error("all {requested} symbols failed to load")]
    AllSymbolsFailed { requested: usize },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unparseable index '{value}' on line {line}")]
    BadIndex { value: String, line: u64 },

    #[error("unparseable price '{value}' for {instrument} on line {line}")]
    BadPrice {
        value: String,
        instrument: String,
        line: u64,
    },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("no cached table '{name}'")]
    NoCachedData { name: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Sampling interval of a quote series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Daily,
    ThirtyMinutes,
}

/// How far back a request reaches from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteRange {
    OneMonth,
    FiveYears,
    TenYears,
}

impl QuoteRange {
    /// Calendar days covered by the range.
    pub fn days(self) -> i64 {
        match self {
            Self::OneMonth => 30,
            Self::FiveYears => 5 * 365,
            Self::TenYears => 10 * 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub symbol: String,
    pub range: QuoteRange,
    pub granularity: Granularity,
}

impl QuoteRequest {
    pub fn new(symbol: impl Into<String>, range: QuoteRange, granularity: Granularity) -> Self {
        Self {
            symbol: symbol.into(),
            range,
            granularity,
        }
    }

    /// Ten years of daily closes.
    pub fn daily_history(symbol: impl Into<String>) -> Self {
        Self::new(symbol, QuoteRange::TenYears, Granularity::Daily)
    }

    /// One month of half-hourly closes.
    pub fn intraday(symbol: impl Into<String>) -> Self {
        Self::new(symbol, QuoteRange::OneMonth, Granularity::ThirtyMinutes)
    }
}

/// A single close observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

/// Trait for quote providers.
///
/// Implementations return quotes for one symbol in any order; the aligner
/// sorts and deduplicates.
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch(&self, request: &QuoteRequest) -> Result<Vec<Quote>, DataError>;
}
