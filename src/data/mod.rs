//! Data loading
//!
//! Handles:
//! - Local end-of-day options files (CSV/TXT, one or many per dataset)

pub mod dataset;

pub use dataset::*;
