//! Parquet cache for named price tables.
//!
//! Layout: `{cache_dir}/{name}.parquet` plus a `{name}.meta.json` sidecar.
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity validation on load (schema check, row count > 0)
//! - Metadata sidecar per table (hash, index range, instruments)

use super::provider::DataError;
use crate::domain::{PriceTable, TimeIndex};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the index column in the Parquet file.
const INDEX_COLUMN: &str = "date";

/// Metadata sidecar for a cached table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub name: String,
    pub first: String,
    pub last: String,
    pub rows: usize,
    pub instruments: Vec<String>,
    pub data_hash: String,
    pub cached_at: chrono::NaiveDateTime,
}

/// Cache status for a single table name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub name: String,
    pub cached: bool,
    pub rows: Option<usize>,
    pub first: Option<String>,
    pub last: Option<String>,
}

/// The Parquet table cache.
pub struct TableCache {
    cache_dir: PathBuf,
}

impl TableCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{name}.parquet"))
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{name}.meta.json"))
    }

    /// Write a table under `name`, replacing any previous version.
    pub fn write<T: TimeIndex>(&self, name: &str, table: &PriceTable<T>) -> Result<(), DataError> {
        let (Some(first), Some(last)) = (table.first_index(), table.last_index()) else {
            return Err(DataError::CacheError("no rows to cache".into()));
        };

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut df = table_to_dataframe(table)?;
        let path = self.table_path(name);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&mut df, &tmp_path)?;

        // Atomic rename
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            name: name.to_string(),
            first: first.to_string(),
            last: last.to_string(),
            rows: table.len(),
            instruments: table.instruments().to_vec(),
            data_hash: table.fingerprint(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(name), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        tracing::info!(name, rows = meta.rows, path = %path.display(), "cached table");
        Ok(())
    }

    /// Load a cached table.
    pub fn load<T: TimeIndex>(&self, name: &str) -> Result<PriceTable<T>, DataError> {
        let path = self.table_path(name);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                name: name.to_string(),
            });
        }

        let table: PriceTable<T> = load_and_validate_parquet(&path)?;

        if let Some(meta) = self.get_meta(name) {
            if meta.data_hash != table.fingerprint() {
                tracing::warn!(name, "cached table does not match its metadata hash");
            }
        }
        Ok(table)
    }

    pub fn get_meta(&self, name: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(name)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Which of `names` are cached, and their index ranges.
    pub fn status<S: AsRef<str>>(&self, names: &[S]) -> Vec<CacheStatus> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let meta = self.get_meta(name);
                CacheStatus {
                    name: name.to_string(),
                    cached: meta.is_some() && self.table_path(name).exists(),
                    rows: meta.as_ref().map(|m| m.rows),
                    first: meta.as_ref().map(|m| m.first.clone()),
                    last: meta.as_ref().map(|m| m.last.clone()),
                }
            })
            .collect()
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

/// The index is stored as text so daily and intraday tables share a layout.
fn table_to_dataframe<T: TimeIndex>(table: &PriceTable<T>) -> Result<DataFrame, DataError> {
    if table.position(INDEX_COLUMN).is_some() {
        return Err(DataError::ValidationError(format!(
            "instrument name '{INDEX_COLUMN}' collides with the index column"
        )));
    }

    let index: Vec<String> = table.index().iter().map(|t| t.to_string()).collect();
    let mut columns = Vec::with_capacity(table.width() + 1);
    columns.push(Column::new(INDEX_COLUMN.into(), index));
    for (id, cells) in table.columns() {
        columns.push(Column::new(id.into(), cells.to_vec()));
    }

    DataFrame::new(columns).map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet<T: TimeIndex>(path: &Path) -> Result<PriceTable<T>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    if df.column(INDEX_COLUMN).is_err() {
        return Err(DataError::ValidationError(format!(
            "missing column '{INDEX_COLUMN}'"
        )));
    }

    dataframe_to_table(&df)
}

fn dataframe_to_table<T: TimeIndex>(df: &DataFrame) -> Result<PriceTable<T>, DataError> {
    let map_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));

    let index_ca = df
        .column(INDEX_COLUMN)
        .map_err(map_err)?
        .as_materialized_series()
        .str()
        .map_err(|e| DataError::ParquetError(format!("index column type: {e}")))?;

    let mut index = Vec::with_capacity(df.height());
    for (i, raw) in index_ca.into_iter().enumerate() {
        let raw = raw.ok_or_else(|| DataError::ParquetError(format!("null index at row {i}")))?;
        let at = T::parse_index(raw)
            .ok_or_else(|| DataError::ValidationError(format!("bad index '{raw}' at row {i}")))?;
        index.push(at);
    }

    let mut instruments = Vec::new();
    let mut columns = Vec::new();
    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == INDEX_COLUMN {
            continue;
        }
        let ca = column
            .f64()
            .map_err(|e| DataError::ParquetError(format!("{name} column type: {e}")))?;
        instruments.push(name.to_string());
        columns.push(ca.into_iter().collect());
    }

    Ok(PriceTable::new(index, instruments, columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn sample_table() -> PriceTable {
        PriceTable::new(
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ],
            vec!["SPY".into(), "QQQ".into()],
            vec![vec![Some(470.0), Some(472.5)], vec![None, Some(405.1)]],
        )
        .unwrap()
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());

        cache.write("daily", &sample_table()).unwrap();
        let loaded: PriceTable = cache.load("daily").unwrap();

        assert_eq!(loaded, sample_table());
    }

    #[test]
    fn intraday_index_survives() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        let ts = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
        let table = PriceTable::new(
            vec![ts("2024-01-02 09:30:00"), ts("2024-01-02 10:00:00")],
            vec!["SPY".into()],
            vec![vec![Some(1.0), Some(2.0)]],
        )
        .unwrap();

        cache.write("intraday", &table).unwrap();
        let loaded: PriceTable<NaiveDateTime> = cache.load("intraday").unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        assert!(matches!(
            cache.load::<NaiveDate>("missing"),
            Err(DataError::NoCachedData { .. })
        ));
    }

    #[test]
    fn empty_table_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        let empty = PriceTable::<NaiveDate>::empty(vec!["SPY".into()]);
        assert!(cache.write("daily", &empty).is_err());
    }

    #[test]
    fn cache_meta_records_range_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        cache.write("daily", &sample_table()).unwrap();

        let meta = cache.get_meta("daily").unwrap();
        assert_eq!(meta.rows, 2);
        assert_eq!(meta.first, "2024-01-02");
        assert_eq!(meta.last, "2024-01-03");
        assert_eq!(meta.instruments, vec!["SPY", "QQQ"]);
        assert_eq!(meta.data_hash, sample_table().fingerprint());
    }

    #[test]
    fn cache_status_query() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        cache.write("daily", &sample_table()).unwrap();

        let statuses = cache.status(&["daily", "intraday"]);
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].cached);
        assert_eq!(statuses[0].rows, Some(2));
        assert!(!statuses[1].cached);
    }

    #[test]
    fn index_named_instrument_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TableCache::new(dir.path());
        let table = PriceTable::new(
            vec![NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()],
            vec!["date".into()],
            vec![vec![Some(1.0)]],
        )
        .unwrap();
        assert!(matches!(
            cache.write("daily", &table),
            Err(DataError::ValidationError(_))
        ));
    }
}
