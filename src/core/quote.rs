//! Option quote data
//!
//! End-of-day snapshot rows for a single underlying: one row per
//! (quote date, expiry, strike) with last traded call/put prices.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Calendar days per year used for time-to-expiration
pub const DAYS_PER_YEAR: f64 = 365.0;

/// End-of-day option quote with every required field present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Trading day the snapshot was taken
    pub quote_date: NaiveDate,
    /// Contract expiration date
    pub expire_date: NaiveDate,
    /// Strike price
    pub strike: f64,
    /// Underlying last price at quote time
    pub underlying_last: f64,
    /// Last traded call price
    pub call_last: f64,
    /// Last traded put price
    pub put_last: f64,
}

impl OptionQuote {
    /// Time to expiration in years (calendar days / 365)
    pub fn time_to_expiration(&self) -> f64 {
        (self.expire_date - self.quote_date).num_days() as f64 / DAYS_PER_YEAR
    }

    /// Moneyness: K / S
    pub fn moneyness(&self) -> f64 {
        self.strike / self.underlying_last
    }
}

/// A quote that survived filtering, with its derived fields attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredQuote {
    pub quote: OptionQuote,
    /// Strictly positive
    pub time_to_expiration: f64,
    /// Within the retained moneyness band
    pub moneyness: f64,
}

impl FilteredQuote {
    pub fn new(quote: OptionQuote) -> Self {
        let time_to_expiration = quote.time_to_expiration();
        let moneyness = quote.moneyness();
        Self {
            quote,
            time_to_expiration,
            moneyness,
        }
    }
}
