//! Implied Volatility Surface Pipeline
//!
//! Turns the loaded dataset plus one set of user parameters into a
//! render-ready surface.
//!
//! Three-stage pipeline:
//! 1. **Filter**: Complete rows, positive time to expiry, one quote date,
//!    positive call price, moneyness within [0.5, 1.5]
//! 2. **Solve**: Black-Scholes implied vol per row, keep 1% < σ < 200%
//! 3. **Interpolate**: Delaunay + linear barycentric onto a 100×100 grid
//!
//! Every run is synchronous and recomputes everything from the dataset;
//! nothing derived is cached between parameter changes.

mod config;
mod filter;
mod interpolate;
mod solve;

pub use config::*;
pub use filter::*;
pub use interpolate::*;
pub use solve::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{ImpliedVolPoint, InterpolatedGrid, SurfaceAxis};
use crate::data::OptionDataset;

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceStatus {
    /// Grid has at least one defined cell
    Ready,
    /// No row survived filtering and solving
    NoData,
    /// Points exist but cannot be triangulated (fewer than 3, or collinear)
    Degenerate,
}

impl SurfaceStatus {
    /// Message shown in place of the surface
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SurfaceStatus::Ready => None,
            SurfaceStatus::NoData => Some("No option data for the selected date"),
            SurfaceStatus::Degenerate => {
                Some("Not enough distinct points to build a surface for the selected date")
            }
        }
    }
}

/// Underlying reference plane at a constant strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingPlane {
    pub price: f64,
}

/// Row counts after each stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub rows_loaded: usize,
    pub rows_filtered: usize,
    pub points_solved: usize,
    pub solver_failures: usize,
    pub out_of_band: usize,
    pub defined_cells: usize,
}

/// Render-ready result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRender {
    /// Parameters the run used
    pub config: SurfaceConfig,
    /// Quote date after the weekend shift
    pub effective_date: NaiveDate,
    pub axis: SurfaceAxis,
    pub grid: InterpolatedGrid,
    /// Solved points, present when the overlay toggle is on
    pub raw_points: Option<Vec<ImpliedVolPoint>>,
    /// Present when requested, on the strike axis, with data for the day
    pub underlying: Option<UnderlyingPlane>,
    pub status: SurfaceStatus,
    pub stats: PipelineStats,
}

impl SurfaceRender {
    pub fn is_ready(&self) -> bool {
        self.status == SurfaceStatus::Ready
    }
}

/// Pipeline bound to a loaded, read-only dataset
pub struct SurfacePipeline<'a> {
    dataset: &'a OptionDataset,
    interpolation: InterpolationConfig,
}

impl<'a> SurfacePipeline<'a> {
    /// Create with default interpolation settings
    pub fn new(dataset: &'a OptionDataset) -> Self {
        Self {
            dataset,
            interpolation: InterpolationConfig::default(),
        }
    }

    /// Create with custom interpolation settings
    pub fn with_interpolation(dataset: &'a OptionDataset, interpolation: InterpolationConfig) -> Self {
        Self {
            dataset,
            interpolation,
        }
    }

    /// Run filter → solve → interpolate for one set of parameters.
    ///
    /// Never fails: rows that cannot be used are dropped, and an empty
    /// result is reported through `status`.
    pub fn run(&self, config: &SurfaceConfig) -> SurfaceRender {
        let filtered = filter_quotes(self.dataset.rows(), config.input_date);
        let solved = solve_points(&filtered.quotes, config.risk_free_rate, config.y_axis);
        let grid = interpolate_surface(&solved.points, &self.interpolation);

        let status = if solved.points.is_empty() {
            SurfaceStatus::NoData
        } else if grid.is_undefined() {
            SurfaceStatus::Degenerate
        } else {
            SurfaceStatus::Ready
        };

        let underlying = if config.wants_underlying_plane() && !solved.points.is_empty() {
            filtered.quotes.first().map(|q| UnderlyingPlane {
                price: q.quote.underlying_last,
            })
        } else {
            None
        };

        let stats = PipelineStats {
            rows_loaded: self.dataset.len(),
            rows_filtered: filtered.quotes.len(),
            points_solved: solved.points.len(),
            solver_failures: solved.solver_failures,
            out_of_band: solved.out_of_band,
            defined_cells: grid.defined_count(),
        };

        tracing::info!(
            "Surface for {} ({}): {} rows, {} points, {} cells defined",
            filtered.effective_date,
            config.y_axis,
            stats.rows_filtered,
            stats.points_solved,
            stats.defined_cells
        );
        if let Some(msg) = status.message() {
            tracing::warn!("{}", msg);
        }

        SurfaceRender {
            config: config.clone(),
            effective_date: filtered.effective_date,
            axis: config.y_axis,
            grid,
            raw_points: config.show_data_pts.then_some(solved.points),
            underlying,
            status,
            stats,
        }
    }
}

/// Run the pipeline once with default interpolation settings
pub fn build_surface(dataset: &OptionDataset, config: &SurfaceConfig) -> SurfaceRender {
    SurfacePipeline::new(dataset).run(config)
}
