//! # Vol Tool - Implied Volatility Surface
//!
//! Builds an implied-volatility surface for one trading day of historical
//! end-of-day equity options data (AAPL by default).
//!
//! ## Overview
//!
//! Each run takes the loaded dataset and a `SurfaceConfig` (risk-free
//! rate, strike-or-moneyness axis, quote date, display toggles) and:
//!
//! 1. **Filters** the dataset to usable calls for the (weekend-shifted) date
//! 2. **Solves** Black-Scholes implied volatility per row
//! 3. **Interpolates** the scattered points onto a 100×100 grid
//!    (Delaunay + linear barycentric)
//!
//! The result is a `SurfaceRender` that the PNG renderer or the desktop GUI
//! draws.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vol_tool::prelude::*;
//!
//! // Load the dataset once
//! let dataset = OptionDataset::load("data/aapl_2023_q1").unwrap();
//!
//! // Build a surface for one day
//! let config = SurfaceConfig {
//!     y_axis: SurfaceAxis::Moneyness,
//!     show_data_pts: true,
//!     ..Default::default()
//! };
//! let surface = build_surface(&dataset, &config);
//!
//! // Draw it
//! render_png(&surface, "surface.png", &RenderOptions::default()).unwrap();
//! ```
//!
//! ## What This Tool Does NOT Do
//!
//! - Price options or compute Greeks beyond what IV inversion needs
//! - Fetch or cache data over the network
//! - Account for dividends or early exercise (European, zero yield)

pub mod core;
pub mod data;
pub mod models;
pub mod pipeline;
pub mod render;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        FilteredQuote, ImpliedVolPoint, InterpolatedGrid, OptionQuote, OptionType, SurfaceAxis,
        VolToolError, VolToolResult,
    };

    // Data loading
    pub use crate::data::{OptionDataset, RawOptionRow};

    // Models
    pub use crate::models::{implied_volatility, norm_cdf, norm_pdf, price as bs_price, vega};

    // Pipeline
    pub use crate::pipeline::{
        build_surface, filter_quotes, interpolate_surface, shift_to_trading_day, solve_points,
        InterpolationConfig, PipelineStats, SurfaceConfig, SurfacePipeline, SurfaceRender,
        SurfaceStatus, UnderlyingPlane, GRID_RESOLUTION,
    };

    // Rendering
    pub use crate::render::{render_png, vol_color, RenderOptions};
}

// Re-export main types at crate root
pub use crate::core::{VolToolError, VolToolResult};
pub use crate::pipeline::{build_surface, SurfaceConfig, SurfaceRender};
