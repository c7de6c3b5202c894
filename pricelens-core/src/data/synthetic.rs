//! Deterministic random-walk quotes for offline use and tests.
//!
//! Each symbol gets its own seed (BLAKE3 of the symbol and granularity), so a
//! given `(symbol, range, granularity, end)` always produces the same series.

use super::provider::{DataError, Granularity, Quote, QuoteProvider, QuoteRequest};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Half-hour bar times for the regular session, 09:30 through 16:00.
const SESSION_BARS: usize = 14;

pub struct SyntheticProvider {
    end: NaiveDate,
}

impl SyntheticProvider {
    /// Series end on `end` (inclusive).
    pub fn new(end: NaiveDate) -> Self {
        Self { end }
    }

    /// Series end today.
    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl QuoteProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &QuoteRequest) -> Result<Vec<Quote>, DataError> {
        if !is_valid_symbol(&request.symbol) {
            return Err(DataError::SymbolNotFound {
                symbol: request.symbol.clone(),
            });
        }

        let start = self.end - Duration::days(request.range.days());
        let mut rng = seeded_rng(&request.symbol, request.granularity);
        let mut price: f64 = rng.gen_range(20.0..500.0);
        let mut quotes = Vec::new();

        let mut current = start;
        while current <= self.end {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                for timestamp in bar_times(current, request.granularity) {
                    let step: f64 = match request.granularity {
                        Granularity::Daily => rng.gen_range(-0.03..0.03),
                        Granularity::ThirtyMinutes => rng.gen_range(-0.005..0.005),
                    };
                    price *= 1.0 + step;
                    quotes.push(Quote {
                        timestamp,
                        close: price,
                    });
                }
            }
            let Some(next) = current.succ_opt() else {
                break;
            };
            current = next;
        }

        if quotes.is_empty() {
            return Err(DataError::EmptyResponse {
                symbol: request.symbol.clone(),
            });
        }
        tracing::debug!(
            symbol = %request.symbol,
            granularity = ?request.granularity,
            quotes = quotes.len(),
            "generated synthetic quotes"
        );
        Ok(quotes)
    }
}

fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

fn seeded_rng(symbol: &str, granularity: Granularity) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(match granularity {
        Granularity::Daily => b"daily",
        Granularity::ThirtyMinutes => b"30min",
    });
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

fn bar_times(date: NaiveDate, granularity: Granularity) -> Vec<NaiveDateTime> {
    match granularity {
        Granularity::Daily => date.and_hms_opt(16, 0, 0).into_iter().collect(),
        Granularity::ThirtyMinutes => {
            let Some(open) = date.and_hms_opt(9, 30, 0) else {
                return Vec::new();
            };
            (0..SESSION_BARS as i64)
                .map(|k| open + Duration::minutes(30 * k))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::QuoteRange;

    fn provider() -> SyntheticProvider {
        // A Friday
        SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    #[test]
    fn same_symbol_same_series() {
        let p = provider();
        let a = p.fetch(&QuoteRequest::daily_history("SPY")).unwrap();
        let b = p.fetch(&QuoteRequest::daily_history("SPY")).unwrap();
        assert_eq!(a, b);
        let c = p.fetch(&QuoteRequest::daily_history("QQQ")).unwrap();
        assert_ne!(a[0].close, c[0].close);
    }

    #[test]
    fn daily_skips_weekends() {
        let quotes = provider()
            .fetch(&QuoteRequest::new("SPY", QuoteRange::OneMonth, Granularity::Daily))
            .unwrap();
        assert!(quotes
            .iter()
            .all(|q| !matches!(q.timestamp.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(quotes.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(
            quotes.last().unwrap().timestamp.date(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn intraday_has_fourteen_bars_per_session() {
        let quotes = provider().fetch(&QuoteRequest::intraday("AAPL")).unwrap();
        let last_day: Vec<&Quote> = quotes
            .iter()
            .filter(|q| q.timestamp.date() == NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
            .collect();
        assert_eq!(last_day.len(), SESSION_BARS);
        assert_eq!(last_day[0].timestamp.time().to_string(), "09:30:00");
        assert_eq!(last_day[13].timestamp.time().to_string(), "16:00:00");
    }

    #[test]
    fn prices_stay_positive() {
        let quotes = provider().fetch(&QuoteRequest::daily_history("VOO")).unwrap();
        assert!(quotes.iter().all(|q| q.close > 0.0 && q.close.is_finite()));
    }

    #[test]
    fn invalid_symbol_is_not_found() {
        let err = provider()
            .fetch(&QuoteRequest::daily_history("NOT A TICKER"))
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "NOT A TICKER"));
    }
}
