//! Integration tests for the data layer using the frozen price fixture.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use pricelens_core::data::{
    fetch_tables, read_price_csv, read_price_csv_from, write_price_csv, DataError,
    SyntheticProvider, TableCache,
};
use pricelens_core::{compute_canonical, CellStatus, PriceTable};
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/prices.csv")
}

fn load_fixture() -> PriceTable {
    read_price_csv(&fixture_path()).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn fixture_shape() {
    let table = load_fixture();
    assert_eq!(table.len(), 86);
    assert_eq!(table.instruments(), &["VOO", "AAPL", "MSFT", "NEWCO"]);
    assert_eq!(table.first_index(), Some(date("2024-01-02")));
    assert_eq!(table.last_index(), Some(date("2024-04-30")));
}

#[test]
fn fixture_gaps_are_absent() {
    let table = load_fixture();
    assert_eq!(table.value("AAPL", date("2024-02-14")), None);
    assert_eq!(table.value("NEWCO", date("2024-02-29")), None);
    assert_eq!(table.value("NEWCO", date("2024-03-01")), Some(20.60));
    assert!(table
        .index()
        .iter()
        .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
}

#[test]
fn fixture_performance() {
    let table = load_fixture();
    let record = compute_canonical(&table);
    assert_eq!(record.as_of, Some(date("2024-04-30")));

    // 1 Months starts on Sunday 2024-03-31; the first observation is Monday.
    let voo = record.cell("VOO", "1 Months").unwrap();
    assert_eq!(voo.status, CellStatus::Computed);
    let expected = (341.78 - 360.39) / 360.39 * 100.0;
    assert!((voo.value - expected).abs() < 1e-9);

    // NEWCO lists on 2024-03-01, a month after the 3 Months start.
    let newco = record.cell("NEWCO", "3 Months").unwrap();
    assert_eq!(newco.status, CellStatus::Stale);
    assert_eq!(newco.value, 0.0);
    assert!(record.cell("NEWCO", "1 Months").unwrap().is_computed());

    // Nothing reaches back a year.
    for id in table.instruments() {
        assert_eq!(record.cell(id, "1 Years").unwrap().status, CellStatus::Stale);
    }
}

#[test]
fn csv_roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let table = load_fixture();

    write_price_csv(&table, &path).unwrap();
    let reloaded: PriceTable = read_price_csv(&path).unwrap();
    assert_eq!(reloaded, table);
}

#[test]
fn missing_csv_is_io_error() {
    let err = read_price_csv::<NaiveDate>(&PathBuf::from("/nonexistent/prices.csv")).unwrap_err();
    assert!(matches!(err, DataError::Io { .. }));
}

#[test]
fn ragged_csv_is_rejected() {
    let csv = "date,A,B\n2024-01-02,1.0\n";
    assert!(matches!(
        read_price_csv_from::<NaiveDate, _>(csv.as_bytes()),
        Err(DataError::Csv(_))
    ));
}

#[test]
fn duplicate_dates_keep_first_row() {
    let csv = "date,A\n2024-01-02,1.0\n2024-01-02,2.0\n2024-01-03,3.0\n";
    let table: PriceTable = read_price_csv_from(csv.as_bytes()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.column("A").unwrap()[0], Some(1.0));
}

#[test]
fn fixture_survives_parquet_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TableCache::new(dir.path());
    let table = load_fixture();

    cache.write("daily", &table).unwrap();
    let loaded: PriceTable = cache.load("daily").unwrap();
    assert_eq!(loaded, table);
    assert_eq!(cache.get_meta("daily").unwrap().data_hash, table.fingerprint());
}

#[test]
fn cache_overwrite_replaces_table() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TableCache::new(dir.path());
    let table = load_fixture();

    cache.write("daily", &table).unwrap();
    let shorter = table.slice(0..10);
    cache.write("daily", &shorter).unwrap();

    let loaded: PriceTable = cache.load("daily").unwrap();
    assert_eq!(loaded.len(), 10);
    assert_eq!(cache.get_meta("daily").unwrap().rows, 10);
    // no temp files left behind
    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn synthetic_tables_cache_and_reload() {
    let provider = SyntheticProvider::new(date("2024-03-15"));
    let tables = fetch_tables(&provider, &["SPY", "QQQ", "AAPL"]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cache = TableCache::new(dir.path());
    cache.write("daily", &tables.daily).unwrap();
    cache.write("intraday", &tables.intraday).unwrap();

    let daily: PriceTable<NaiveDate> = cache.load("daily").unwrap();
    let intraday: PriceTable<NaiveDateTime> = cache.load("intraday").unwrap();
    assert_eq!(daily, tables.daily);
    assert_eq!(intraday, tables.intraday);
}

#[test]
fn intraday_csv_is_not_a_daily_table() {
    let csv = "date,SPY\n2024-01-02 09:30:00,470.1\n2024-01-02 16:00:00,472.3\n";
    match read_price_csv_from::<NaiveDate, _>(csv.as_bytes()) {
        Err(DataError::BadIndex { value, line }) => {
            assert_eq!(value, "2024-01-02 09:30:00");
            assert_eq!(line, 2);
        }
        other => panic!("expected BadIndex, got {other:?}"),
    }

    let intraday: PriceTable<NaiveDateTime> = read_price_csv_from(csv.as_bytes()).unwrap();
    assert_eq!(intraday.len(), 2);
}
