//! Renders PNG charts of each reactor's retained history.

use anyhow::Result;
use plotters::prelude::*;
use reactorlab_core::{fleet::Fleet, reactor::Reactor};
use reactorlab_schemas::metrics::HistoryPoint;
use std::path::Path;

const COLORS: [RGBColor; 6] = [RED, BLUE, GREEN, MAGENTA, CYAN, BLACK];

/// A named line: (history id, value) pairs.
struct Series {
    label: String,
    points: Vec<(u64, f64)>,
}

impl Series {
    fn from_history(label: &str, history: &[&HistoryPoint], value: impl Fn(&HistoryPoint) -> f64) -> Self {
        Self {
            label: label.to_string(),
            points: history.iter().map(|p| (p.id, value(p))).collect(),
        }
    }
}

/// Writes two charts per reactor plus a fleet-wide yield comparison.
pub fn generate_all_plots(output_dir: &Path, fleet: &Fleet) -> Result<()> {
    println!("[Plotting] Generating graphs from reactor history...");

    if fleet.reactors().all(|r| r.simulator().history().is_empty()) {
        println!("[Plotting] Warning: No data to plot.");
        return Ok(());
    }

    for reactor in fleet.reactors() {
        plot_reactor(output_dir, reactor)?;
    }
    plot_fleet_yield(output_dir, fleet)?;

    println!("[Plotting] Graphs have been saved to '{}'.", output_dir.display());
    Ok(())
}

fn plot_reactor(output_dir: &Path, reactor: &Reactor) -> Result<()> {
    let history: Vec<&HistoryPoint> = reactor.simulator().history().iter().collect();
    if history.is_empty() {
        return Ok(());
    }

    let performance = [
        Series::from_history("Enzyme activity (%)", &history, |p| p.metrics.enzyme_activity),
        Series::from_history("Yield (%)", &history, |p| p.metrics.product_yield),
        Series::from_history("Dissolved O2 (%)", &history, |p| p.metrics.dissolved_oxygen),
    ];
    line_chart(
        &output_dir.join(format!("{}_performance.png", reactor.id())),
        &format!("{} Performance", reactor.name()),
        "Percent",
        &performance,
    )?;

    let conditions = [
        Series::from_history("Temperature (°C)", &history, |p| p.metrics.temperature),
        Series::from_history("pH x 5", &history, |p| p.metrics.ph * 5.0),
        Series::from_history("Substrate (g/L)", &history, |p| p.metrics.substrate_concentration),
    ];
    line_chart(
        &output_dir.join(format!("{}_conditions.png", reactor.id())),
        &format!("{} Process Conditions", reactor.name()),
        "Value",
        &conditions,
    )
}

fn plot_fleet_yield(output_dir: &Path, fleet: &Fleet) -> Result<()> {
    let series: Vec<Series> = fleet
        .reactors()
        .map(|reactor| {
            let history: Vec<&HistoryPoint> = reactor.simulator().history().iter().collect();
            Series::from_history(reactor.id(), &history, |p| p.metrics.product_yield)
        })
        .collect();
    line_chart(&output_dir.join("fleet_yield.png"), "Fleet Yield", "Yield (%)", &series)
}

fn line_chart(path: &Path, caption: &str, y_desc: &str, series: &[Series]) -> Result<()> {
    let all_points = || series.iter().flat_map(|s| s.points.iter());
    let min_x = all_points().map(|&(x, _)| x).min().unwrap_or(0);
    let max_x = all_points().map(|&(x, _)| x).max().unwrap_or(1).max(min_x + 1);
    let min_y = all_points().map(|&(_, y)| y).fold(f64::INFINITY, f64::min);
    let max_y = all_points().map(|&(_, y)| y).fold(f64::NEG_INFINITY, f64::max);
    let (min_y, max_y) = if min_y.is_finite() && max_y.is_finite() {
        let pad = ((max_y - min_y) * 0.1).max(1.0);
        (min_y - pad, max_y + pad)
    } else {
        (0.0, 100.0)
    };

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(min_x..max_x, min_y..max_y)?;

    chart
        .configure_mesh()
        .x_desc("Tick")
        .y_desc(y_desc)
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
