//! Vol Tool CLI
//!
//! Command-line interface for the implied volatility surface pipeline.
//!
//! # Commands
//!
//! - `vol-tool summary` - Rows and date coverage of the dataset
//! - `vol-tool surface --date 2023-03-31` - Build a surface, export JSON/PNG
//! - `vol-tool solve --price 6.55 --spot 164.9 --strike 160 --tte 0.0575` - One-shot IV

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vol_tool::pipeline::{DEFAULT_RISK_FREE_RATE, MAX_IMPLIED_VOL, MIN_IMPLIED_VOL};
use vol_tool::prelude::*;

/// Implied volatility surface tool
#[derive(Parser)]
#[command(name = "vol-tool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Dataset file or directory of CSV/TXT files
    #[arg(short, long, global = true, env = "VOL_TOOL_DATA", default_value = "data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
    Strike,
    Moneyness,
}

impl From<AxisArg> for SurfaceAxis {
    fn from(arg: AxisArg) -> Self {
        match arg {
            AxisArg::Strike => SurfaceAxis::StrikePrice,
            AxisArg::Moneyness => SurfaceAxis::Moneyness,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show dataset size and covered quote dates
    Summary,

    /// Build the implied volatility surface for one day
    Surface {
        /// Quote date (YYYY-MM-DD); weekends shift back to Friday
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Risk-free rate, e.g. 0.025 for 2.5%
        #[arg(short, long, default_value_t = DEFAULT_RISK_FREE_RATE)]
        rate: f64,

        /// Surface y-axis
        #[arg(short, long, value_enum, default_value = "strike")]
        axis: AxisArg,

        /// Overlay the solved data points
        #[arg(long)]
        show_data_pts: bool,

        /// Draw the underlying price plane (strike axis only)
        #[arg(long)]
        show_underlying: bool,

        /// Triangulate in raw units instead of rescaled axes
        #[arg(long)]
        no_rescale: bool,

        /// Write the surface as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write a 3D chart as PNG
        #[arg(long)]
        png: Option<PathBuf>,
    },

    /// Solve a single implied volatility
    Solve {
        #[arg(long)]
        price: f64,

        #[arg(long)]
        spot: f64,

        #[arg(long)]
        strike: f64,

        /// Time to expiration in years
        #[arg(long)]
        tte: f64,

        #[arg(short, long, default_value_t = DEFAULT_RISK_FREE_RATE)]
        rate: f64,

        /// Treat the price as a put
        #[arg(long)]
        put: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Summary => summary(&cli.data),
        Commands::Surface {
            date,
            rate,
            axis,
            show_data_pts,
            show_underlying,
            no_rescale,
            json,
            png,
        } => {
            let dataset = load(&cli.data)?;
            let covered = dataset.covered_range();

            // Without --date, start from the default day pulled into the dataset's range
            let input_date = match date {
                Some(d) => d,
                None => SurfaceConfig::default().clamped(covered).input_date,
            };

            let config = SurfaceConfig {
                risk_free_rate: rate,
                y_axis: axis.into(),
                show_data_pts,
                show_underlying,
                input_date,
            };
            config.validate(covered)?;

            let interpolation = InterpolationConfig {
                rescale: !no_rescale,
            };
            let surface = SurfacePipeline::with_interpolation(&dataset, interpolation).run(&config);
            print_surface(&surface);

            if let Some(path) = json {
                let writer = BufWriter::new(
                    File::create(&path).with_context(|| format!("creating {}", path.display()))?,
                );
                serde_json::to_writer_pretty(writer, &surface)?;
                info!("Wrote surface JSON to {}", path.display());
            }

            if let Some(path) = png {
                render_png(&surface, &path, &RenderOptions::default())?;
            }

            Ok(())
        }
        Commands::Solve {
            price,
            spot,
            strike,
            tte,
            rate,
            put,
        } => {
            let option_type = if put { OptionType::Put } else { OptionType::Call };
            let iv = implied_volatility(price, spot, strike, rate, 0.0, tte, option_type)?;

            println!("Implied Volatility: {:.2}%", iv * 100.0);
            if !(iv > MIN_IMPLIED_VOL && iv < MAX_IMPLIED_VOL) {
                println!(
                    "  (outside the {:.0}%-{:.0}% band used for surfaces)",
                    MIN_IMPLIED_VOL * 100.0,
                    MAX_IMPLIED_VOL * 100.0
                );
            }
            Ok(())
        }
    }
}

fn load(path: &PathBuf) -> Result<OptionDataset> {
    OptionDataset::load(path).with_context(|| format!("loading dataset from {}", path.display()))
}

fn summary(path: &PathBuf) -> Result<()> {
    let dataset = load(path)?;

    println!("Dataset: {}", path.display());
    println!("  Rows: {}", dataset.len());
    println!("  Complete rows: {}", dataset.complete_rows());

    match dataset.covered_range() {
        Some((first, last)) => {
            println!("  Covered: {} to {}", first, last);
            println!("  Quote dates: {}", dataset.quote_dates().len());
        }
        None => println!("  Covered: (no parseable quote dates)"),
    }
    Ok(())
}

fn print_surface(surface: &SurfaceRender) {
    let stats = &surface.stats;

    println!("Implied Volatility Surface");
    println!("==========================\n");
    println!("  Requested date: {}", surface.config.input_date);
    println!("  Quote date:     {}", surface.effective_date);
    println!("  Y-axis:         {}", surface.axis);
    println!("  Risk-free rate: {:.2}%\n", surface.config.risk_free_rate * 100.0);

    println!("Pipeline:");
    println!("  Rows loaded:     {}", stats.rows_loaded);
    println!("  Rows filtered:   {}", stats.rows_filtered);
    println!("  Points solved:   {}", stats.points_solved);
    println!("  Solver failures: {}", stats.solver_failures);
    println!("  Out of band:     {}", stats.out_of_band);

    let (nx, ny) = surface.grid.shape();
    println!("  Grid:            {}x{} ({} defined)", nx, ny, stats.defined_cells);

    if let Some(msg) = surface.status.message() {
        println!("\n{}", msg);
        return;
    }

    if let (Some((x_lo, x_hi)), Some((y_lo, y_hi)), Some((z_lo, z_hi))) = (
        surface.grid.x_range(),
        surface.grid.y_range(),
        surface.grid.z_range(),
    ) {
        println!("\nRanges:");
        println!("  Time to expiry: {:.4} to {:.4} years", x_lo, x_hi);
        println!("  {}: {:.4} to {:.4}", surface.axis, y_lo, y_hi);
        println!("  Implied vol:    {:.2}% to {:.2}%", z_lo, z_hi);
    }

    if let Some(plane) = surface.underlying {
        println!("  Underlying:     ${:.2}", plane.price);
    }
}
