//! Black-Scholes Model
//!
//! Provides:
//! - European option pricing
//! - Vega for the Newton step
//! - Implied volatility solver (Newton-Raphson with bisection fallback)
//!
//! The solver is the inversion step of the surface pipeline: every
//! end-of-day call price is turned back into the volatility that reproduces it.

use std::f64::consts::{PI, SQRT_2};
use statrs::function::erf::erfc;
use crate::core::{OptionType, VolToolError, VolToolResult};

/// Lower edge of the solver's volatility bracket
pub const MIN_SOLVER_VOL: f64 = 0.001;
/// Upper edge of the solver's volatility bracket
pub const MAX_SOLVER_VOL: f64 = 5.0;

const MAX_ITER: usize = 100;
const PRICE_TOL: f64 = 1e-8;

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, div: f64, vol: f64, time: f64) -> f64 {
    let forward = spot * ((rate - div) * time).exp();
    ((forward / strike).ln() + 0.5 * vol * vol * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, div: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, div, vol, time) - vol * time.sqrt()
}

/// Black-Scholes European option price
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> f64 {
    if time <= 0.0 {
        return option_type.intrinsic(spot, strike);
    }

    let df = (-rate * time).exp();
    let forward = spot * ((rate - div) * time).exp();

    if vol <= 0.0 {
        // Zero vol = intrinsic value discounted
        return df * option_type.intrinsic(forward, strike);
    }

    let d1 = d1(spot, strike, rate, div, vol, time);
    let d2 = d2(spot, strike, rate, div, vol, time);

    match option_type {
        OptionType::Call => df * (forward * norm_cdf(d1) - strike * norm_cdf(d2)),
        OptionType::Put => df * (strike * norm_cdf(-d2) - forward * norm_cdf(-d1)),
    }
}

/// Vega: dV/dσ (per unit vol, same for call and put)
pub fn vega(spot: f64, strike: f64, rate: f64, div: f64, vol: f64, time: f64) -> f64 {
    if time <= 0.0 || vol <= 0.0 {
        return 0.0;
    }
    let d1 = d1(spot, strike, rate, div, vol, time);
    spot * (-div * time).exp() * norm_pdf(d1) * time.sqrt()
}

/// Implied volatility solver using Newton-Raphson with bisection fallback
///
/// Returns an error when the inputs are non-positive, the price lies outside
/// the no-arbitrage band, or neither method converges within its iteration
/// budget. The result is deterministic for identical inputs.
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    time: f64,
    option_type: OptionType,
) -> VolToolResult<f64> {
    // Sanity checks
    if !market_price.is_finite() || market_price <= 0.0 {
        return Err(VolToolError::numerical("Non-positive option price"));
    }
    if !time.is_finite() || time <= 0.0 {
        return Err(VolToolError::numerical("Non-positive time to expiry"));
    }
    if !(spot > 0.0 && strike > 0.0) {
        return Err(VolToolError::numerical("Non-positive spot or strike"));
    }

    let (lower, upper) = option_type.arbitrage_bounds(spot, strike, rate, div, time);
    if market_price <= lower {
        return Err(VolToolError::numerical(format!(
            "Price {:.4} at or below arbitrage lower bound {:.4}",
            market_price, lower
        )));
    }
    if market_price >= upper {
        return Err(VolToolError::numerical(format!(
            "Price {:.4} at or above arbitrage upper bound {:.4}",
            market_price, upper
        )));
    }

    // Initial guess using Brenner-Subrahmanyam approximation
    let mut vol = (market_price / (0.4 * spot * time.sqrt())).clamp(0.01, 3.0);

    for _ in 0..MAX_ITER {
        let diff = price(spot, strike, rate, div, vol, time, option_type) - market_price;

        if diff.abs() < PRICE_TOL {
            return Ok(vol);
        }

        let v = vega(spot, strike, rate, div, vol, time);
        if v.abs() < 1e-12 {
            break; // Vega too small, switch to bisection
        }

        let new_vol = vol - diff / v;
        if !new_vol.is_finite() || new_vol <= 0.0 || new_vol > MAX_SOLVER_VOL {
            break; // Out of bounds, switch to bisection
        }

        vol = new_vol;
    }

    bisection_iv(market_price, spot, strike, rate, div, time, option_type)
}

/// Bisection method for IV (slower but more robust)
fn bisection_iv(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    div: f64,
    time: f64,
    option_type: OptionType,
) -> VolToolResult<f64> {
    let mut low = MIN_SOLVER_VOL;
    let mut high = MAX_SOLVER_VOL;

    // Price is monotone in vol; the root must be bracketed
    let price_low = price(spot, strike, rate, div, low, time, option_type);
    let price_high = price(spot, strike, rate, div, high, time, option_type);
    if market_price < price_low || market_price > price_high {
        return Err(VolToolError::numerical(format!(
            "IV not bracketed in [{}, {}]",
            MIN_SOLVER_VOL, MAX_SOLVER_VOL
        )));
    }

    for _ in 0..MAX_ITER {
        let mid = 0.5 * (low + high);
        let diff = price(spot, strike, rate, div, mid, time, option_type) - market_price;

        if diff.abs() < PRICE_TOL || (high - low) < PRICE_TOL {
            return Ok(mid);
        }

        if diff > 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    Err(VolToolError::numerical("IV solver did not converge"))
}
