//! Pricing Models
//!
//! Implements:
//! - Black-Scholes (pricing, vega, implied volatility inversion)

pub mod black_scholes;

pub use black_scholes::*;
