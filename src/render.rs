//! Surface rendering
//!
//! Draws a `SurfaceRender` as a 3D chart (PNG) with plotters. Axes:
//! time to expiration (x), implied vol % (vertical), strike or moneyness
//! (depth). The colormap and cell geometry are shared with the GUI.

use std::path::Path;

use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{VolToolError, VolToolResult};
use crate::pipeline::SurfaceRender;

/// Viridis-like stops, low vol to high vol
const COLOR_STOPS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

/// Output image settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    /// Camera rotation around the vertical axis (radians)
    pub yaw: f64,
    /// Camera elevation (radians)
    pub pitch: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
            yaw: 0.6,
            pitch: 0.3,
        }
    }
}

/// One grid cell as a quad: corners `(x, y, vol)` counter-clockwise, plus
/// the mean vol used for colouring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceQuad {
    pub corners: [(f64, f64, f64); 4],
    pub mean_vol: f64,
}

/// Map `t` in [0, 1] onto the colormap
pub fn vol_color(t: f64) -> [u8; 3] {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (COLOR_STOPS.len() - 1) as f64;
    let i = (pos.floor() as usize).min(COLOR_STOPS.len() - 2);
    let frac = pos - i as f64;

    let (lo, hi) = (COLOR_STOPS[i], COLOR_STOPS[i + 1]);
    let mut out = [0u8; 3];
    for c in 0..3 {
        out[c] = (lo[c] as f64 + frac * (hi[c] as f64 - lo[c] as f64)).round() as u8;
    }
    out
}

/// Position of `value` within `range`, for colouring
pub fn normalize(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        (value - lo) / (hi - lo)
    } else {
        0.5
    }
}

/// Quads for every fully defined grid cell
pub fn surface_quads(surface: &SurfaceRender) -> Vec<SurfaceQuad> {
    let grid = &surface.grid;
    grid.complete_cells()
        .map(|(xi, yi, v)| {
            let (x0, x1) = (grid.x_axis[xi], grid.x_axis[xi + 1]);
            let (y0, y1) = (grid.y_axis[yi], grid.y_axis[yi + 1]);
            SurfaceQuad {
                corners: [(x0, y0, v[0]), (x1, y0, v[1]), (x1, y1, v[2]), (x0, y1, v[3])],
                mean_vol: v.iter().sum::<f64>() / 4.0,
            }
        })
        .collect()
}

/// Vol range used for colouring and the vertical axis
pub fn vol_range(surface: &SurfaceRender) -> Option<(f64, f64)> {
    let raw = surface.raw_points.iter().flatten().map(|p| p.implied_vol_pct);
    let grid = surface.grid.values.iter().flatten().copied();

    raw.chain(grid).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Widen a zero-width range so it can be used as a chart axis
fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        let pad = if lo.abs() > 0.0 { lo.abs() * 0.05 } else { 1.0 };
        (lo - pad, hi + pad)
    }
}

fn render_err(e: impl std::fmt::Display) -> VolToolError {
    VolToolError::render(e.to_string())
}

/// Write the surface to a PNG file
pub fn render_png(
    surface: &SurfaceRender,
    path: impl AsRef<Path>,
    options: &RenderOptions,
) -> VolToolResult<()> {
    let path = path.as_ref();
    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let title = format!(
        "Implied Volatility Surface, {} (x: years to expiry, z: {})",
        surface.effective_date, surface.axis
    );

    let (Some(x_range), Some(y_range), Some(z_range)) = (
        surface.grid.x_range(),
        surface.grid.y_range(),
        vol_range(surface),
    ) else {
        let msg = surface
            .status
            .message()
            .unwrap_or("No option data for the selected date");
        root.draw(&Text::new(
            format!("{}: {}", surface.effective_date, msg),
            (40, 40),
            ("sans-serif", 24).into_font(),
        ))
        .map_err(render_err)?;
        root.present().map_err(render_err)?;
        tracing::info!("Wrote empty surface chart to {}", path.display());
        return Ok(());
    };

    let mut y_range = y_range;
    if let Some(plane) = surface.underlying {
        y_range = (y_range.0.min(plane.price), y_range.1.max(plane.price));
    }

    let (x_lo, x_hi) = padded(x_range);
    let (y_lo, y_hi) = padded(y_range);
    let (z_lo, z_hi) = padded(z_range);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .build_cartesian_3d(x_lo..x_hi, z_lo..z_hi, y_lo..y_hi)
        .map_err(render_err)?;

    let (yaw, pitch) = (options.yaw, options.pitch);
    chart.with_projection(|mut pb| {
        pb.yaw = yaw;
        pb.pitch = pitch;
        pb.scale = 0.85;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.1))
        .max_light_lines(3)
        .draw()
        .map_err(render_err)?;

    let quads = surface_quads(surface);
    chart
        .draw_series(quads.iter().map(|q| {
            let [r, g, b] = vol_color(normalize(q.mean_vol, z_range));
            let pts = q.corners.iter().map(|&(x, y, v)| (x, v, y)).collect::<Vec<_>>();
            Polygon::new(pts, RGBColor(r, g, b).mix(0.9).filled())
        }))
        .map_err(render_err)?;

    if let Some(plane) = surface.underlying {
        let p = plane.price;
        chart
            .draw_series(std::iter::once(Polygon::new(
                vec![(x_lo, z_lo, p), (x_hi, z_lo, p), (x_hi, z_hi, p), (x_lo, z_hi, p)],
                RED.mix(0.2).filled(),
            )))
            .map_err(render_err)?;
    }

    if let Some(points) = &surface.raw_points {
        chart
            .draw_series(points.iter().map(|p| {
                Circle::new(
                    (p.time_to_expiration, p.implied_vol_pct, p.strike_or_moneyness),
                    2,
                    BLACK.filled(),
                )
            }))
            .map_err(render_err)?;
    }

    root.present().map_err(render_err)?;
    tracing::info!("Wrote {} surface cells to {}", quads.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ImpliedVolPoint, InterpolatedGrid, SurfaceAxis};
    use crate::pipeline::{PipelineStats, SurfaceConfig, SurfaceStatus, UnderlyingPlane};
    use tempfile::tempdir;

    fn surface() -> SurfaceRender {
        let mut grid = InterpolatedGrid::undefined(vec![0.1, 0.2, 0.3], vec![150.0, 160.0]);
        for xi in 0..3 {
            for yi in 0..2 {
                grid.values[[xi, yi]] = Some(20.0 + xi as f64 + yi as f64);
            }
        }
        let config = SurfaceConfig::default();
        SurfaceRender {
            effective_date: config.input_date,
            axis: SurfaceAxis::StrikePrice,
            config,
            grid,
            raw_points: Some(vec![ImpliedVolPoint {
                time_to_expiration: 0.15,
                strike_or_moneyness: 155.0,
                implied_vol_pct: 35.0,
            }]),
            underlying: Some(UnderlyingPlane { price: 164.9 }),
            status: SurfaceStatus::Ready,
            stats: PipelineStats::default(),
        }
    }

    #[test]
    fn test_vol_color_endpoints() {
        assert_eq!(vol_color(0.0), COLOR_STOPS[0]);
        assert_eq!(vol_color(1.0), COLOR_STOPS[4]);
        assert_eq!(vol_color(-3.0), COLOR_STOPS[0]);
        assert_eq!(vol_color(f64::NAN), COLOR_STOPS[0]);
        assert_eq!(vol_color(0.5), COLOR_STOPS[2]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(25.0, (20.0, 30.0)), 0.5);
        assert_eq!(normalize(25.0, (25.0, 25.0)), 0.5);
    }

    #[test]
    fn test_quads_and_range() {
        let s = surface();
        let quads = surface_quads(&s);
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].corners[0], (0.1, 150.0, 20.0));
        assert_eq!(quads[0].corners[2], (0.2, 160.0, 22.0));
        assert!((quads[0].mean_vol - 21.0).abs() < 1e-12);

        // Raw overlay widens the vertical range
        assert_eq!(vol_range(&s), Some((20.0, 35.0)));
    }

    #[test]
    fn test_padded() {
        assert_eq!(padded((1.0, 2.0)), (1.0, 2.0));
        let (lo, hi) = padded((0.0, 0.0));
        assert!(lo < 0.0 && hi > 0.0);
    }

    #[test]
    #[ignore] // Requires system fonts
    fn test_render_png() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("surface.png");
        render_png(&surface(), &path, &RenderOptions::default()).unwrap();
        assert!(path.exists());

        let mut empty = surface();
        empty.grid = InterpolatedGrid::empty();
        empty.raw_points = None;
        empty.status = SurfaceStatus::NoData;
        let path = dir.path().join("empty.png");
        render_png(&empty, &path, &RenderOptions::default()).unwrap();
        assert!(path.exists());
    }
}
