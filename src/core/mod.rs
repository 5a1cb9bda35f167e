//! Core data types for the volatility tool
//!
//! Defines fundamental types:
//! - OptionType: Call/put with no-arbitrage bounds
//! - OptionQuote: End-of-day quote row with derived time/moneyness
//! - ImpliedVolPoint / InterpolatedGrid: Scattered and gridded surface
//! - VolToolError: Crate error type

pub mod option;
pub mod quote;
pub mod surface;
pub mod error;

pub use option::*;
pub use quote::*;
pub use surface::*;
pub use error::*;
