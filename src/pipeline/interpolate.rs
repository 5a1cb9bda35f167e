//! Stage 3: Scattered-data interpolation
//!
//! Projects scattered (time, strike-or-moneyness, vol) points onto a regular
//! grid: Delaunay-triangulate the points, then evaluate each grid node by
//! linear barycentric interpolation inside the triangle that contains it.
//! Nodes outside the convex hull stay `None`.
//!
//! Time to expiration (~0.01..3) and strike (~50..300) live on very
//! different scales, so by default both axes are rescaled (offset by the
//! mean, divided by the peak-to-peak range) before triangulating. Without
//! it the triangulation degenerates into long slivers along the strike axis.

use delaunator::{triangulate, Point};

use super::InterpolationConfig;
use crate::core::{ImpliedVolPoint, InterpolatedGrid};

/// Samples per grid axis
pub const GRID_RESOLUTION: usize = 100;

/// Barycentric slack so nodes on hull edges count as inside
const EDGE_EPS: f64 = 1e-9;

/// `n` evenly spaced samples from `min` to `max`, endpoints exact
pub fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { max } else { min + step * i as f64 })
                .collect()
        }
    }
}

/// Per-axis affine map applied before triangulation
#[derive(Debug, Clone, Copy)]
struct AxisScale {
    offset: f64,
    scale: f64,
}

impl AxisScale {
    fn identity() -> Self {
        Self {
            offset: 0.0,
            scale: 1.0,
        }
    }

    fn fit(values: impl Iterator<Item = f64> + Clone) -> Self {
        let n = values.clone().count() as f64;
        let (lo, hi) = min_max(values.clone()).unwrap_or((0.0, 0.0));
        let ptp = hi - lo;
        Self {
            offset: values.sum::<f64>() / n,
            scale: if ptp > 0.0 { ptp } else { 1.0 },
        }
    }

    fn apply(&self, v: f64) -> f64 {
        (v - self.offset) / self.scale
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Interpolate scattered points onto a `GRID_RESOLUTION` square grid.
///
/// - No points: empty grid (no axes).
/// - Fewer than three points, or all collinear: axes are built but every
///   cell is `None`.
pub fn interpolate_surface(
    points: &[ImpliedVolPoint],
    config: &InterpolationConfig,
) -> InterpolatedGrid {
    let xs = points.iter().map(|p| p.time_to_expiration);
    let ys = points.iter().map(|p| p.strike_or_moneyness);

    let (Some((x_min, x_max)), Some((y_min, y_max))) = (min_max(xs.clone()), min_max(ys.clone()))
    else {
        return InterpolatedGrid::empty();
    };

    let mut grid = InterpolatedGrid::undefined(
        linspace(x_min, x_max, GRID_RESOLUTION),
        linspace(y_min, y_max, GRID_RESOLUTION),
    );

    if points.len() < 3 {
        return grid;
    }

    let (sx, sy) = if config.rescale {
        (AxisScale::fit(xs), AxisScale::fit(ys))
    } else {
        (AxisScale::identity(), AxisScale::identity())
    };

    let scaled: Vec<Point> = points
        .iter()
        .map(|p| Point {
            x: sx.apply(p.time_to_expiration),
            y: sy.apply(p.strike_or_moneyness),
        })
        .collect();

    let triangulation = triangulate(&scaled);
    if triangulation.triangles.is_empty() {
        tracing::debug!("Triangulation is degenerate for {} points", points.len());
        return grid;
    }

    let gx: Vec<f64> = grid.x_axis.iter().map(|&x| sx.apply(x)).collect();
    let gy: Vec<f64> = grid.y_axis.iter().map(|&y| sy.apply(y)).collect();

    for tri in triangulation.triangles.chunks_exact(3) {
        let (a, b, c) = (&scaled[tri[0]], &scaled[tri[1]], &scaled[tri[2]]);
        let (za, zb, zc) = (
            points[tri[0]].implied_vol_pct,
            points[tri[1]].implied_vol_pct,
            points[tri[2]].implied_vol_pct,
        );

        let denom = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
        if denom.abs() < f64::EPSILON {
            continue;
        }

        let (x_lo, x_hi) = index_span(&gx, a.x.min(b.x).min(c.x), a.x.max(b.x).max(c.x));
        let (y_lo, y_hi) = index_span(&gy, a.y.min(b.y).min(c.y), a.y.max(b.y).max(c.y));

        for xi in x_lo..x_hi {
            for yi in y_lo..y_hi {
                if grid.values[[xi, yi]].is_some() {
                    continue;
                }

                let (px, py) = (gx[xi], gy[yi]);
                let l1 = ((b.y - c.y) * (px - c.x) + (c.x - b.x) * (py - c.y)) / denom;
                let l2 = ((c.y - a.y) * (px - c.x) + (a.x - c.x) * (py - c.y)) / denom;
                let l3 = 1.0 - l1 - l2;

                if l1 >= -EDGE_EPS && l2 >= -EDGE_EPS && l3 >= -EDGE_EPS {
                    grid.values[[xi, yi]] = Some(l1 * za + l2 * zb + l3 * zc);
                }
            }
        }
    }

    grid
}

/// Index range `[lo, hi)` of sorted `axis` values within `[min, max]`
/// (widened by the edge tolerance)
fn index_span(axis: &[f64], min: f64, max: f64) -> (usize, usize) {
    let lo = axis.partition_point(|&v| v < min - EDGE_EPS);
    let hi = axis.partition_point(|&v| v <= max + EDGE_EPS);
    (lo, hi.max(lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64, k: f64, vol: f64) -> ImpliedVolPoint {
        ImpliedVolPoint {
            time_to_expiration: t,
            strike_or_moneyness: k,
            implied_vol_pct: vol,
        }
    }

    /// Vol linear in both coordinates, so linear interpolation is exact
    fn plane(t: f64, k: f64) -> f64 {
        20.0 + 10.0 * t - 0.05 * (k - 150.0)
    }

    fn lattice() -> Vec<ImpliedVolPoint> {
        let mut points = Vec::new();
        for &t in &[0.05, 0.25, 0.5, 1.0] {
            for &k in &[120.0, 140.0, 160.0, 180.0] {
                points.push(point(t, k, plane(t, k)));
            }
        }
        points
    }

    #[test]
    fn test_linspace() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(0.1, 0.7, 100).last(), Some(&0.7));
        assert_eq!(linspace(3.0, 3.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let grid = interpolate_surface(&[], &InterpolationConfig::default());
        assert!(grid.is_empty());
        assert!(grid.x_axis.is_empty());
    }

    #[test]
    fn test_too_few_points() {
        let points = vec![point(0.1, 150.0, 25.0), point(0.2, 160.0, 27.0)];
        let grid = interpolate_surface(&points, &InterpolationConfig::default());
        assert_eq!(grid.shape(), (GRID_RESOLUTION, GRID_RESOLUTION));
        assert!(grid.is_undefined());
    }

    #[test]
    fn test_collinear_points() {
        // Single expiry: every point on one vertical line
        let points: Vec<_> = (0..6)
            .map(|i| point(0.25, 140.0 + 5.0 * i as f64, 25.0))
            .collect();
        let grid = interpolate_surface(&points, &InterpolationConfig::default());
        assert!(grid.is_undefined());
    }

    #[test]
    fn test_grid_shape_and_ranges() {
        let points = lattice();
        let grid = interpolate_surface(&points, &InterpolationConfig::default());

        assert_eq!(grid.shape(), (GRID_RESOLUTION, GRID_RESOLUTION));
        assert_eq!(grid.x_range(), Some((0.05, 1.0)));
        assert_eq!(grid.y_range(), Some((120.0, 180.0)));
        // Rectangular hull covers the whole grid
        assert_eq!(grid.defined_count(), GRID_RESOLUTION * GRID_RESOLUTION);
    }

    #[test]
    fn test_linear_surface_is_reproduced() {
        for rescale in [true, false] {
            let grid = interpolate_surface(&lattice(), &InterpolationConfig { rescale });
            for xi in (0..GRID_RESOLUTION).step_by(7) {
                for yi in (0..GRID_RESOLUTION).step_by(11) {
                    let expected = plane(grid.x_axis[xi], grid.y_axis[yi]);
                    let got = grid.value_at(xi, yi).unwrap();
                    assert!((got - expected).abs() < 1e-8, "rescale={} at ({}, {})", rescale, xi, yi);
                }
            }
        }
    }

    #[test]
    fn test_outside_hull_is_undefined() {
        // Triangle occupying the lower-left half of its bounding box
        let points = vec![
            point(0.0, 100.0, 20.0),
            point(1.0, 100.0, 30.0),
            point(0.0, 200.0, 40.0),
        ];
        let grid = interpolate_surface(&points, &InterpolationConfig::default());

        assert!(grid.value_at(0, 0).is_some());
        assert!(grid.value_at(GRID_RESOLUTION - 1, GRID_RESOLUTION - 1).is_none());
        assert!(grid.value_at(GRID_RESOLUTION - 1, 0).is_some());
        assert!(grid.value_at(0, GRID_RESOLUTION - 1).is_some());

        // Interpolated values never leave the input range
        let (lo, hi) = grid.z_range().unwrap();
        assert!(lo >= 20.0 - 1e-9 && hi <= 40.0 + 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let points = lattice();
        let a = interpolate_surface(&points, &InterpolationConfig::default());
        let b = interpolate_surface(&points, &InterpolationConfig::default());
        assert_eq!(a, b);
    }
}
