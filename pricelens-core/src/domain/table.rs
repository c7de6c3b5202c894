//! PriceTable — the time-indexed, one-column-per-instrument data model.
//!
//! Storage is column-major: `columns[j][i]` is the price of `instruments[j]`
//! at `index[i]`. Absent observations are `None`; absent is never zero.
//!
//! Invariants enforced at construction:
//! - the index is strictly ascending (sorted, no duplicate timestamps)
//! - every column has exactly one cell per index entry
//! - instrument ids are unique
//! - stored values are finite (NaN/inf become `None`)

use super::time_index::TimeIndex;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::ops::Range;
use thiserror::Error;

/// Instrument identifier (ticker or ISIN).
pub type InstrumentId = String;

/// Structural errors when building a table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("{given} columns supplied for {declared} instruments")]
    ColumnCount { declared: usize, given: usize },

    #[error("column '{instrument}' has {actual} cells, expected {expected}")]
    ColumnLength {
        instrument: String,
        expected: usize,
        actual: usize,
    },

    #[error("index is not strictly ascending at row {row}")]
    UnsortedIndex { row: usize },

    #[error("duplicate instrument '{0}'")]
    DuplicateInstrument(String),
}

/// Date-indexed price table. Defaults to a daily index.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable<T = NaiveDate> {
    index: Vec<T>,
    instruments: Vec<InstrumentId>,
    columns: Vec<Vec<Option<f64>>>,
}

impl<T: TimeIndex> PriceTable<T> {
    /// Build a table from an already sorted index and column-major cells.
    pub fn new(
        index: Vec<T>,
        instruments: Vec<InstrumentId>,
        columns: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, TableError> {
        if columns.len() != instruments.len() {
            return Err(TableError::ColumnCount {
                declared: instruments.len(),
                given: columns.len(),
            });
        }

        let mut seen = HashSet::with_capacity(instruments.len());
        for id in &instruments {
            if !seen.insert(id.as_str()) {
                return Err(TableError::DuplicateInstrument(id.clone()));
            }
        }

        for (id, column) in instruments.iter().zip(&columns) {
            if column.len() != index.len() {
                return Err(TableError::ColumnLength {
                    instrument: id.clone(),
                    expected: index.len(),
                    actual: column.len(),
                });
            }
        }

        if let Some(row) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(TableError::UnsortedIndex { row: row + 1 });
        }

        let columns = columns
            .into_iter()
            .map(|column| column.into_iter().map(finite).collect())
            .collect();

        Ok(Self {
            index,
            instruments,
            columns,
        })
    }

    /// Build a table from rows in any order.
    ///
    /// Rows are sorted by timestamp; for duplicate timestamps the first row
    /// wins. Each row must carry one cell per instrument.
    pub fn from_rows(
        instruments: Vec<InstrumentId>,
        mut rows: Vec<(T, Vec<Option<f64>>)>,
    ) -> Result<Self, TableError> {
        rows.sort_by_key(|(t, _)| *t);
        let before = rows.len();
        rows.dedup_by_key(|(t, _)| *t);
        if rows.len() < before {
            tracing::warn!(
                dropped = before - rows.len(),
                "duplicate timestamps in price rows, keeping first occurrence"
            );
        }

        let mut index = Vec::with_capacity(rows.len());
        let mut columns = vec![Vec::with_capacity(rows.len()); instruments.len()];
        for (t, cells) in rows {
            if cells.len() != instruments.len() {
                return Err(TableError::ColumnCount {
                    declared: instruments.len(),
                    given: cells.len(),
                });
            }
            index.push(t);
            for (column, cell) in columns.iter_mut().zip(cells) {
                column.push(cell);
            }
        }

        Self::new(index, instruments, columns)
    }

    /// A table with the given columns and no rows.
    pub fn empty(instruments: Vec<InstrumentId>) -> Self {
        let columns = vec![Vec::new(); instruments.len()];
        Self {
            index: Vec::new(),
            instruments,
            columns,
        }
    }

    pub fn index(&self) -> &[T] {
        &self.index
    }

    pub fn instruments(&self) -> &[InstrumentId] {
        &self.instruments
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of instrument columns.
    pub fn width(&self) -> usize {
        self.instruments.len()
    }

    pub fn first_index(&self) -> Option<T> {
        self.index.first().copied()
    }

    pub fn last_index(&self) -> Option<T> {
        self.index.last().copied()
    }

    /// Column position of an instrument.
    pub fn position(&self, instrument: &str) -> Option<usize> {
        self.instruments.iter().position(|id| id == instrument)
    }

    pub fn column(&self, instrument: &str) -> Option<&[Option<f64>]> {
        self.position(instrument).map(|j| self.columns[j].as_slice())
    }

    /// Iterate `(instrument, cells)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> + '_ {
        self.instruments
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Cell at an exact timestamp.
    pub fn value(&self, instrument: &str, at: T) -> Option<f64> {
        let i = self.index.binary_search(&at).ok()?;
        self.column(instrument).and_then(|column| column[i])
    }

    /// All cells of row `i`, in column order.
    pub fn row(&self, i: usize) -> Option<Vec<Option<f64>>> {
        (i < self.len()).then(|| self.columns.iter().map(|column| column[i]).collect())
    }

    /// First row position whose timestamp is `>= at`.
    pub fn lower_bound(&self, at: T) -> usize {
        self.index.partition_point(|t| *t < at)
    }

    /// Rows in `range`, all columns kept.
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self {
            index: self.index[range.clone()].to_vec(),
            instruments: self.instruments.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| column[range.clone()].to_vec())
                .collect(),
        }
    }

    /// Keep only the named instruments, in table order. Unknown names are
    /// ignored.
    pub fn select<S: AsRef<str>>(&self, instruments: &[S]) -> Self {
        let wanted: HashSet<&str> = instruments.iter().map(AsRef::as_ref).collect();
        let (ids, columns) = self
            .instruments
            .iter()
            .zip(&self.columns)
            .filter(|(id, _)| wanted.contains(id.as_str()))
            .map(|(id, column)| (id.clone(), column.clone()))
            .unzip();
        Self {
            index: self.index.clone(),
            instruments: ids,
            columns,
        }
    }

    /// Rebuild every column through `f`, keeping index and instruments.
    ///
    /// `f` must return one cell per row; non-finite results are stored as
    /// absent.
    pub(crate) fn map_columns<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&str, &[Option<f64>]) -> Vec<Option<f64>>,
    {
        let columns = self
            .columns()
            .map(|(id, cells)| {
                let mapped = f(id, cells);
                debug_assert_eq!(mapped.len(), cells.len(), "column '{id}' changed length");
                mapped.into_iter().map(finite).collect()
            })
            .collect();
        Self {
            index: self.index.clone(),
            instruments: self.instruments.clone(),
            columns,
        }
    }

    /// Deterministic BLAKE3 hash over index and cells.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for t in &self.index {
            hasher.update(t.to_string().as_bytes());
        }
        for (id, cells) in self.columns() {
            hasher.update(id.as_bytes());
            for cell in cells {
                match cell {
                    Some(v) => hasher.update(&v.to_le_bytes()),
                    None => hasher.update(b"-"),
                };
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

fn finite(cell: Option<f64>) -> Option<f64> {
    cell.filter(|v| v.is_finite())
}
