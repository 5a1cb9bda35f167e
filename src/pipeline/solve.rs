//! Stage 2: Per-row implied volatility
//!
//! Each filtered quote's last call price is inverted with Black-Scholes
//! (zero dividend yield). Solver failures and results outside the sane
//! volatility band are dropped explicitly.

use serde::{Deserialize, Serialize};

use crate::core::{FilteredQuote, ImpliedVolPoint, OptionType, SurfaceAxis};
use crate::models::implied_volatility;

/// Solved vols must lie strictly inside (MIN_IMPLIED_VOL, MAX_IMPLIED_VOL)
pub const MIN_IMPLIED_VOL: f64 = 0.01;
pub const MAX_IMPLIED_VOL: f64 = 2.0;

/// Outcome of solving one quote
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    Solved(f64),
    /// Solver error (arbitrage bounds, no convergence)
    Failed,
    /// Solved, but outside the accepted vol band
    OutOfBand(f64),
}

/// Points produced by the solve stage with drop counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolvedPoints {
    pub points: Vec<ImpliedVolPoint>,
    pub solver_failures: usize,
    pub out_of_band: usize,
}

/// Invert one quote's call price
pub fn solve_quote(quote: &FilteredQuote, rate: f64) -> SolveOutcome {
    let result = implied_volatility(
        quote.quote.call_last,
        quote.quote.underlying_last,
        quote.quote.strike,
        rate,
        0.0,
        quote.time_to_expiration,
        OptionType::Call,
    );

    match result {
        Ok(vol) if vol > MIN_IMPLIED_VOL && vol < MAX_IMPLIED_VOL => SolveOutcome::Solved(vol),
        Ok(vol) => SolveOutcome::OutOfBand(vol),
        Err(e) => {
            tracing::trace!(
                "IV solve failed for K={} T={:.4}: {}",
                quote.quote.strike,
                quote.time_to_expiration,
                e
            );
            SolveOutcome::Failed
        }
    }
}

/// Accepted implied vol for one quote, or `None`
pub fn solve_implied_vol(quote: &FilteredQuote, rate: f64) -> Option<f64> {
    match solve_quote(quote, rate) {
        SolveOutcome::Solved(vol) => Some(vol),
        _ => None,
    }
}

/// Solve every quote, keeping input order
pub fn solve_points(quotes: &[FilteredQuote], rate: f64, axis: SurfaceAxis) -> SolvedPoints {
    let mut solved = SolvedPoints::default();

    for quote in quotes {
        match solve_quote(quote, rate) {
            SolveOutcome::Solved(vol) => solved.points.push(ImpliedVolPoint {
                time_to_expiration: quote.time_to_expiration,
                strike_or_moneyness: axis.value_of(quote),
                implied_vol_pct: vol * 100.0,
            }),
            SolveOutcome::Failed => solved.solver_failures += 1,
            SolveOutcome::OutOfBand(_) => solved.out_of_band += 1,
        }
    }

    tracing::debug!(
        "Solved {} points ({} failures, {} out of band)",
        solved.points.len(),
        solved.solver_failures,
        solved.out_of_band
    );

    solved
}
