//! Vol Tool GUI
//!
//! Interactive implied volatility surface. Every control change re-runs the
//! pipeline against the dataset loaded at startup.

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Weekday};
use clap::Parser;
use eframe::egui;
use egui_plot::{HLine, Plot, PlotPoints, Points, Polygon};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vol_tool::pipeline::{RISK_FREE_RATE_MAX, RISK_FREE_RATE_MIN};
use vol_tool::prelude::*;
use vol_tool::render::{normalize, surface_quads, vol_range};

#[derive(Parser)]
#[command(name = "vol-tool-gui", about = "Interactive implied volatility surface")]
struct Args {
    /// Dataset file or directory of CSV/TXT files
    #[arg(env = "VOL_TOOL_DATA", default_value = "data")]
    data: PathBuf,
}

enum DateAction {
    None,
    Typed,
    Step(i64),
}

struct VolApp {
    // Data
    dataset: OptionDataset,
    covered: Option<(NaiveDate, NaiveDate)>,
    load_status: String,

    // UI state
    config: SurfaceConfig,
    date_input: String,
    date_error: Option<String>,

    // Computed
    surface: SurfaceRender,
}

impl VolApp {
    fn new(dataset: OptionDataset, load_status: String) -> Self {
        let covered = dataset.covered_range();
        let config = SurfaceConfig::default().clamped(covered);
        let surface = build_surface(&dataset, &config);

        Self {
            date_input: config.input_date.to_string(),
            dataset,
            covered,
            load_status,
            config,
            date_error: None,
            surface,
        }
    }

    fn recompute(&mut self) {
        self.config = self.config.clone().clamped(self.covered);
        self.date_input = self.config.input_date.to_string();
        self.surface = build_surface(&self.dataset, &self.config);
    }

    fn step_date(&mut self, days: i64) {
        self.config.input_date += chrono::Duration::days(days);
        self.date_error = None;
        self.recompute();
    }

    fn apply_date_input(&mut self) {
        match NaiveDate::parse_from_str(self.date_input.trim(), "%Y-%m-%d") {
            Ok(date) => {
                self.config.input_date = date;
                self.date_error = None;
                self.recompute();
            }
            Err(_) => {
                self.date_error = Some(format!("Not a date: {}", self.date_input.trim()));
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Vol Surface");
        ui.separator();

        ui.label(&self.load_status);
        match self.covered {
            Some((first, last)) => ui.label(format!("Covered: {} to {}", first, last)),
            None => ui.label("Covered: none"),
        };

        ui.separator();
        ui.heading("Parameters");

        let mut changed = false;

        changed |= ui
            .add(
                egui::Slider::new(
                    &mut self.config.risk_free_rate,
                    RISK_FREE_RATE_MIN..=RISK_FREE_RATE_MAX,
                )
                .text("Risk-free rate")
                .step_by(0.0005)
                .custom_formatter(|v, _| format!("{:.2}%", v * 100.0)),
            )
            .changed();

        let before = self.config.y_axis;
        egui::ComboBox::from_label("Y-axis")
            .selected_text(self.config.y_axis.label())
            .show_ui(ui, |ui| {
                for axis in SurfaceAxis::all() {
                    ui.selectable_value(&mut self.config.y_axis, axis, axis.label());
                }
            });
        changed |= before != self.config.y_axis;

        ui.separator();
        ui.heading("Date");
        let mut action = DateAction::None;
        ui.horizontal(|ui| {
            if ui.button("<").clicked() {
                action = DateAction::Step(-1);
            }
            let response = ui.add(egui::TextEdit::singleline(&mut self.date_input).desired_width(90.0));
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                action = DateAction::Typed;
            }
            if ui.button(">").clicked() {
                action = DateAction::Step(1);
            }
        });
        match action {
            DateAction::None => {}
            DateAction::Typed => self.apply_date_input(),
            DateAction::Step(days) => self.step_date(days),
        }
        if let Some(err) = &self.date_error {
            ui.colored_label(egui::Color32::LIGHT_RED, err);
        }
        if self.surface.effective_date != self.config.input_date {
            let weekday = match self.config.input_date.weekday() {
                Weekday::Sat => "Saturday",
                _ => "Sunday",
            };
            ui.label(format!("{} quotes from {}", weekday, self.surface.effective_date));
        }

        ui.separator();
        ui.heading("Display");
        changed |= ui
            .checkbox(&mut self.config.show_data_pts, "Show data points")
            .changed();
        changed |= ui
            .checkbox(&mut self.config.show_underlying, "Show underlying")
            .changed();

        if changed {
            self.recompute();
        }

        ui.separator();
        let stats = &self.surface.stats;
        ui.label(format!("Rows filtered: {}", stats.rows_filtered));
        ui.label(format!("Points solved: {}", stats.points_solved));
        ui.label(format!("Solver failures: {}", stats.solver_failures));
        ui.label(format!("Out of band: {}", stats.out_of_band));
        ui.label(format!("Cells defined: {}", stats.defined_cells));
        if let Some((lo, hi)) = self.surface.grid.z_range() {
            ui.label(format!("Vol: {:.1}% to {:.1}%", lo, hi));
        }
    }

    fn surface_plot(&self, ui: &mut egui::Ui) {
        ui.heading(format!(
            "Implied Volatility, {} ({})",
            self.surface.effective_date, self.surface.axis
        ));

        if let Some(msg) = self.surface.status.message() {
            ui.label(msg);
            return;
        }

        let quads = surface_quads(&self.surface);
        let range = vol_range(&self.surface).unwrap_or((0.0, 1.0));

        Plot::new("vol_surface")
            .x_axis_label("Time to expiration (years)")
            .y_axis_label(self.surface.axis.label())
            .legend(egui_plot::Legend::default())
            .show(ui, |plot_ui| {
                for quad in &quads {
                    let [r, g, b] = vol_color(normalize(quad.mean_vol, range));
                    let color = egui::Color32::from_rgb(r, g, b);
                    let corners: Vec<[f64; 2]> = quad.corners.iter().map(|&(x, y, _)| [x, y]).collect();
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::new(corners))
                            .fill_color(color)
                            .stroke(egui::Stroke::new(0.0, color)),
                    );
                }

                if let Some(points) = &self.surface.raw_points {
                    let pts: Vec<[f64; 2]> = points
                        .iter()
                        .map(|p| [p.time_to_expiration, p.strike_or_moneyness])
                        .collect();
                    plot_ui.points(
                        Points::new(PlotPoints::new(pts))
                            .name("Data points")
                            .color(egui::Color32::WHITE)
                            .radius(2.0),
                    );
                }

                if let Some(plane) = self.surface.underlying {
                    plot_ui.hline(
                        HLine::new(plane.price)
                            .name(format!("Underlying ${:.2}", plane.price))
                            .color(egui::Color32::RED)
                            .width(1.5)
                            .style(egui_plot::LineStyle::Dashed { length: 5.0 }),
                    );
                }
            });
    }
}

impl eframe::App for VolApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls").show(ctx, |ui| self.controls(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.surface_plot(ui));
    }
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (dataset, load_status) = match OptionDataset::load(&args.data) {
        Ok(d) => {
            let status = format!("{}: {} rows", args.data.display(), d.len());
            (d, status)
        }
        Err(e) => {
            tracing::error!("Failed to load {}: {}", args.data.display(), e);
            (OptionDataset::default(), format!("Load failed: {}", e))
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_title("Vol Tool - Implied Volatility Surface"),
        ..Default::default()
    };

    eframe::run_native(
        "Vol Tool",
        options,
        Box::new(|_cc| Box::new(VolApp::new(dataset, load_status))),
    )
}
