//! Stage 1: Row filtering and normalization
//!
//! Turns raw dataset rows into quotes usable for one day's surface.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::core::{FilteredQuote, OptionQuote};
use crate::data::RawOptionRow;

/// Retained moneyness band (inclusive)
pub const MIN_MONEYNESS: f64 = 0.5;
pub const MAX_MONEYNESS: f64 = 1.5;

/// Rows kept for a single quote date
#[derive(Debug, Clone)]
pub struct FilteredQuotes {
    /// Date actually used after the weekend shift
    pub effective_date: NaiveDate,
    /// Surviving rows, in dataset order
    pub quotes: Vec<FilteredQuote>,
}

/// Shift weekend dates back to the preceding Friday.
///
/// No holiday calendar: a weekday holiday is returned unchanged.
pub fn shift_to_trading_day(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}

/// Filter the dataset down to usable rows for `target` (weekend-shifted).
///
/// Order: drop incomplete rows, drop non-positive time to expiration,
/// keep the target quote date, drop non-positive call prices, drop rows
/// outside the moneyness band.
pub fn filter_quotes(rows: &[RawOptionRow], target: NaiveDate) -> FilteredQuotes {
    let effective_date = shift_to_trading_day(target);

    let quotes: Vec<FilteredQuote> = rows
        .iter()
        .filter_map(complete_quote)
        .filter(|q| q.time_to_expiration() > 0.0)
        .filter(|q| q.quote_date == effective_date)
        .filter(|q| q.call_last > 0.0)
        .filter(|q| q.strike > 0.0 && q.underlying_last > 0.0)
        .map(FilteredQuote::new)
        .filter(|q| (MIN_MONEYNESS..=MAX_MONEYNESS).contains(&q.moneyness))
        .collect();

    tracing::debug!(
        "Filtered {} of {} rows for {}",
        quotes.len(),
        rows.len(),
        effective_date
    );

    FilteredQuotes {
        effective_date,
        quotes,
    }
}

/// A quote with every required field, or `None`
fn complete_quote(row: &RawOptionRow) -> Option<OptionQuote> {
    Some(OptionQuote {
        quote_date: row.quote_date?,
        expire_date: row.expire_date?,
        strike: row.strike?,
        underlying_last: row.underlying_last?,
        call_last: row.call_last?,
        put_last: row.put_last?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(quote: NaiveDate, expire: NaiveDate, strike: f64, call: f64) -> RawOptionRow {
        RawOptionRow {
            quote_date: Some(quote),
            expire_date: Some(expire),
            strike: Some(strike),
            underlying_last: Some(160.0),
            call_last: Some(call),
            put_last: Some(1.0),
        }
    }

    #[test]
    fn test_weekend_shift() {
        // 2023-03-25 is a Saturday
        assert_eq!(shift_to_trading_day(date(2023, 3, 25)), date(2023, 3, 24));
        assert_eq!(shift_to_trading_day(date(2023, 3, 26)), date(2023, 3, 24));
        for d in 20..=24 {
            assert_eq!(shift_to_trading_day(date(2023, 3, d)), date(2023, 3, d));
        }
    }

    #[test]
    fn test_filter_order_and_rules() {
        let day = date(2023, 3, 24);
        let expiry = date(2023, 4, 21);

        let mut missing = row(day, expiry, 160.0, 5.0);
        missing.put_last = None;

        let rows = vec![
            row(day, expiry, 150.0, 12.0),            // kept
            row(day, day, 160.0, 5.0),                // zero time to expiry
            row(day, date(2023, 3, 17), 160.0, 5.0),  // expired
            row(date(2023, 3, 23), expiry, 160.0, 5.0), // other day
            row(day, expiry, 165.0, 0.0),             // zero call price
            missing,                                  // incomplete
            row(day, expiry, 60.0, 100.0),            // moneyness 0.375
            row(day, expiry, 250.0, 0.01),            // moneyness 1.5625
            row(day, expiry, 80.0, 80.5),             // moneyness 0.5, kept
            row(day, expiry, 170.0, 2.5),             // kept
        ];

        let filtered = filter_quotes(&rows, date(2023, 3, 26));
        assert_eq!(filtered.effective_date, day);

        let strikes: Vec<f64> = filtered.quotes.iter().map(|q| q.quote.strike).collect();
        assert_eq!(strikes, vec![150.0, 80.0, 170.0]);

        for q in &filtered.quotes {
            assert!(q.time_to_expiration > 0.0);
            assert!(q.quote.expire_date > q.quote.quote_date);
            assert!((MIN_MONEYNESS..=MAX_MONEYNESS).contains(&q.moneyness));
        }
    }

    #[test]
    fn test_filter_empty() {
        let rows = vec![row(date(2023, 3, 1), date(2023, 3, 17), 160.0, 4.0)];
        let filtered = filter_quotes(&rows, date(2023, 3, 2));
        assert!(filtered.quotes.is_empty());

        let filtered = filter_quotes(&[], date(2023, 3, 2));
        assert!(filtered.quotes.is_empty());
    }
}
