//! Volatility Surface
//!
//! Scattered implied-vol points and the regular grid they are
//! interpolated onto. Grid values are indexed `[x, y]` where x is time to
//! expiration and y is strike or moneyness.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::VolToolError;
use super::quote::FilteredQuote;

/// Quantity on the surface's second axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceAxis {
    /// Absolute strike
    #[default]
    StrikePrice,
    /// Strike / underlying
    Moneyness,
}

impl SurfaceAxis {
    /// User-facing label
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceAxis::StrikePrice => "Strike Price",
            SurfaceAxis::Moneyness => "Moneyness",
        }
    }

    /// Coordinate of a filtered quote along this axis
    pub fn value_of(&self, quote: &FilteredQuote) -> f64 {
        match self {
            SurfaceAxis::StrikePrice => quote.quote.strike,
            SurfaceAxis::Moneyness => quote.moneyness,
        }
    }

    pub fn all() -> [SurfaceAxis; 2] {
        [SurfaceAxis::StrikePrice, SurfaceAxis::Moneyness]
    }
}

impl fmt::Display for SurfaceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SurfaceAxis {
    type Err = VolToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "strike" | "strike price" => Ok(SurfaceAxis::StrikePrice),
            "moneyness" => Ok(SurfaceAxis::Moneyness),
            other => Err(VolToolError::invalid_input(format!(
                "unknown axis '{}', expected 'Strike Price' or 'Moneyness'",
                other
            ))),
        }
    }
}

/// One solved contract on the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolPoint {
    /// Years
    pub time_to_expiration: f64,
    /// Strike or moneyness, depending on the selected axis
    pub strike_or_moneyness: f64,
    /// Implied volatility in percent (e.g. 25.0 for 25%)
    pub implied_vol_pct: f64,
}

/// Regular mesh of interpolated implied vols
///
/// `values[[xi, yi]]` is the interpolated vol (percent) at
/// `(x_axis[xi], y_axis[yi])`, or `None` outside the convex hull of the
/// input points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedGrid {
    /// Time to expiration samples
    pub x_axis: Vec<f64>,
    /// Strike or moneyness samples
    pub y_axis: Vec<f64>,
    pub values: Array2<Option<f64>>,
}

impl InterpolatedGrid {
    /// Grid with no axes and no cells
    pub fn empty() -> Self {
        Self {
            x_axis: Vec::new(),
            y_axis: Vec::new(),
            values: Array2::from_elem((0, 0), None),
        }
    }

    /// Grid over the given axes with every cell undefined
    pub fn undefined(x_axis: Vec<f64>, y_axis: Vec<f64>) -> Self {
        let shape = (x_axis.len(), y_axis.len());
        Self {
            x_axis,
            y_axis,
            values: Array2::from_elem(shape, None),
        }
    }

    /// (n_x, n_y)
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at grid indices
    pub fn value_at(&self, xi: usize, yi: usize) -> Option<f64> {
        self.values.get([xi, yi]).copied().flatten()
    }

    /// Number of cells with a defined value
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// True when no cell carries a value
    pub fn is_undefined(&self) -> bool {
        self.defined_count() == 0
    }

    pub fn x_range(&self) -> Option<(f64, f64)> {
        Some((*self.x_axis.first()?, *self.x_axis.last()?))
    }

    pub fn y_range(&self) -> Option<(f64, f64)> {
        Some((*self.y_axis.first()?, *self.y_axis.last()?))
    }

    /// Min and max over defined values
    pub fn z_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Grid cells whose four corners are all defined, as
    /// `(xi, yi, [v00, v10, v11, v01])` with corners in counter-clockwise order.
    pub fn complete_cells(&self) -> impl Iterator<Item = (usize, usize, [f64; 4])> + '_ {
        let (nx, ny) = self.shape();
        (0..nx.saturating_sub(1)).flat_map(move |xi| {
            (0..ny.saturating_sub(1)).filter_map(move |yi| {
                Some((
                    xi,
                    yi,
                    [
                        self.value_at(xi, yi)?,
                        self.value_at(xi + 1, yi)?,
                        self.value_at(xi + 1, yi + 1)?,
                        self.value_at(xi, yi + 1)?,
                    ],
                ))
            })
        })
    }
}
