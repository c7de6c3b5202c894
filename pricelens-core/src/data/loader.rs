//! Loads the two price tables the view works from: ten years of daily
//! closes and one month of half-hourly closes.

use super::align::align_quotes;
use super::provider::{DataError, Quote, QuoteProvider, QuoteRequest};
use crate::domain::{InstrumentId, PriceTable};
use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;

/// Daily history and intraday tables over the same instruments.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketTables {
    pub daily: PriceTable<NaiveDate>,
    pub intraday: PriceTable<NaiveDateTime>,
}

/// Fetch and align both tables for `symbols`.
///
/// A symbol whose daily or intraday fetch fails is logged and left out of
/// both tables. Fails only when no symbol could be loaded.
pub fn fetch_tables<P, S>(provider: &P, symbols: &[S]) -> Result<MarketTables, DataError>
where
    P: QuoteProvider + ?Sized,
    S: AsRef<str> + Sync,
{
    let fetched: Vec<Option<(InstrumentId, Vec<Quote>, Vec<Quote>)>> = symbols
        .par_iter()
        .map(|symbol| {
            let symbol = symbol.as_ref();
            let result = provider
                .fetch(&QuoteRequest::daily_history(symbol))
                .and_then(|daily| {
                    provider
                        .fetch(&QuoteRequest::intraday(symbol))
                        .map(|intraday| (daily, intraday))
                });
            match result {
                Ok((daily, intraday)) => Some((symbol.to_string(), daily, intraday)),
                Err(e) => {
                    tracing::warn!(
                        symbol,
                        provider = provider.name(),
                        error = %e,
                        "skipping symbol"
                    );
                    None
                }
            }
        })
        .collect();

    let mut daily = Vec::new();
    let mut intraday = Vec::new();
    for (symbol, d, i) in fetched.into_iter().flatten() {
        daily.push((symbol.clone(), d));
        intraday.push((symbol, i));
    }

    if daily.is_empty() && !symbols.is_empty() {
        return Err(DataError::AllSymbolsFailed {
            requested: symbols.len(),
        });
    }

    let tables = MarketTables {
        daily: align_quotes(&daily)?,
        intraday: align_quotes(&intraday)?,
    };
    tracing::info!(
        instruments = tables.daily.width(),
        daily_rows = tables.daily.len(),
        intraday_rows = tables.intraday.len(),
        "loaded price tables"
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticProvider;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    #[test]
    fn loads_both_tables() {
        let tables = fetch_tables(&provider(), &["SPY", "QQQ"]).unwrap();
        assert_eq!(tables.daily.instruments(), tables.intraday.instruments());
        assert_eq!(tables.daily.width(), 2);
        // about ten years of weekdays
        assert!(tables.daily.len() > 2500);
        assert!(tables.intraday.len() > 14 * 20);
    }

    #[test]
    fn failing_symbol_is_skipped() {
        let tables = fetch_tables(&provider(), &["SPY", "BAD TICKER", "QQQ"]).unwrap();
        assert_eq!(
            tables.daily.instruments(),
            &["SPY".to_string(), "QQQ".to_string()]
        );
    }

    #[test]
    fn all_failing_is_an_error() {
        let err = fetch_tables(&provider(), &["", "BAD TICKER"]).unwrap_err();
        assert!(matches!(err, DataError::AllSymbolsFailed { requested: 2 }));
    }

    #[test]
    fn no_symbols_gives_empty_tables() {
        let tables = fetch_tables::<_, &str>(&provider(), &[]).unwrap();
        assert!(tables.daily.is_empty());
        assert_eq!(tables.daily.width(), 0);
    }
}
