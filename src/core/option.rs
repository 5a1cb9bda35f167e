//! Option type definitions

use serde::{Deserialize, Serialize};

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        (self.phi() * (spot - strike)).max(0.0)
    }

    /// No-arbitrage price band `(lower, upper)` for a European option.
    ///
    /// Lower bound is the discounted forward intrinsic, upper bound is the
    /// discounted spot (call) or discounted strike (put).
    pub fn arbitrage_bounds(
        &self,
        spot: f64,
        strike: f64,
        rate: f64,
        div: f64,
        time: f64,
    ) -> (f64, f64) {
        let spot_df = spot * (-div * time).exp();
        let strike_df = strike * (-rate * time).exp();

        match self {
            OptionType::Call => ((spot_df - strike_df).max(0.0), spot_df),
            OptionType::Put => ((strike_df - spot_df).max(0.0), strike_df),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type() {
        assert_eq!(OptionType::Call.phi(), 1.0);
        assert_eq!(OptionType::Put.phi(), -1.0);

        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
    }

    #[test]
    fn test_arbitrage_bounds() {
        let (lo, hi) = OptionType::Call.arbitrage_bounds(100.0, 90.0, 0.05, 0.0, 1.0);
        assert!((hi - 100.0).abs() < 1e-12);
        assert!((lo - (100.0 - 90.0 * (-0.05_f64).exp())).abs() < 1e-12);

        // Deep OTM call has zero lower bound
        let (lo, _) = OptionType::Call.arbitrage_bounds(100.0, 150.0, 0.05, 0.0, 0.5);
        assert_eq!(lo, 0.0);

        let (lo, hi) = OptionType::Put.arbitrage_bounds(100.0, 110.0, 0.0, 0.0, 1.0);
        assert!((lo - 10.0).abs() < 1e-12);
        assert!((hi - 110.0).abs() < 1e-12);
    }
}
