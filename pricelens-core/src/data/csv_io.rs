//! Wide price CSV: a header row, the time index in the first column and one
//! column per instrument. Empty (or `NaN`) cells are absent.
//!
//! ```text
//! date,AAPL,MSFT
//! 2024-01-02,185.64,370.87
//! 2024-01-03,,370.60
//! ```

use super::provider::DataError;
use crate::domain::{InstrumentId, PriceTable, TimeIndex};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Read a price table from a CSV file.
pub fn read_price_csv<T: TimeIndex>(path: &Path) -> Result<PriceTable<T>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_price_csv_from(file)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.len(),
        instruments = table.width(),
        "read price csv"
    );
    Ok(table)
}

/// Read a price table from any CSV source.
///
/// Rows may come in any order; they are sorted by index and duplicate
/// timestamps keep the first row.
pub fn read_price_csv_from<T: TimeIndex, R: Read>(reader: R) -> Result<PriceTable<T>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let instruments: Vec<InstrumentId> = rdr
        .headers()?
        .iter()
        .skip(1)
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_index = record.get(0).unwrap_or_default();
        let at = T::parse_index(raw_index).ok_or_else(|| DataError::BadIndex {
            value: raw_index.to_string(),
            line,
        })?;

        let cells = instruments
            .iter()
            .enumerate()
            .map(|(j, id)| parse_price(record.get(j + 1).unwrap_or_default(), id, line))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((at, cells));
    }

    Ok(PriceTable::from_rows(instruments, rows)?)
}

fn parse_price(raw: &str, instrument: &str, line: u64) -> Result<Option<f64>, DataError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| DataError::BadPrice {
            value: raw.to_string(),
            instrument: instrument.to_string(),
            line,
        })
}

/// Write a price table as CSV. Absent cells are written as empty fields.
pub fn write_price_csv<T: TimeIndex>(table: &PriceTable<T>, path: &Path) -> Result<(), DataError> {
    let file = File::create(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_price_csv_to(table, file)
}

pub fn write_price_csv_to<T: TimeIndex, W: Write>(
    table: &PriceTable<T>,
    writer: W,
) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(table.instruments().iter().cloned());
    wtr.write_record(&header)?;

    for (i, at) in table.index().iter().enumerate() {
        let mut record = vec![at.to_string()];
        record.extend(
            table
                .columns()
                .map(|(_, cells)| cells[i].map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
