//! Time-series figures.

use std::path::Path;

use chrono::{DateTime, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::{PlotResult, axis_range, timestep_histogram};
use crate::analysis::{CrossDistances, TransectSeries, decimal_year};
use crate::tide::TideSeries;

fn year_range(dates: &[DateTime<Utc>]) -> (f64, f64) {
    let years: Vec<f64> = dates.iter().map(|&d| decimal_year(d)).collect();
    axis_range(&years)
}

fn draw_transect_series(
    area: &DrawingArea<BitMapBackend, Shift>,
    years: &[f64],
    series: &TransectSeries,
    (x0, x1): (f64, f64),
) -> PlotResult {
    let (y0, y1) = axis_range(&series.values);
    let mut chart = ChartBuilder::on(area)
        .caption(format!("Transect {}", series.name), ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .y_desc("cross-shore [m]")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;

    let points: Vec<(f64, f64)> = years
        .iter()
        .zip(&series.values)
        .filter(|(_, v)| v.is_finite())
        .map(|(&t, &v)| (t, v))
        .collect();

    chart.draw_series(LineSeries::new(points.clone(), BLACK.mix(0.4).stroke_width(1)))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 2, BLACK.filled())))?;
    Ok(())
}

/// Cross-shore distance against time, one panel per transect.
pub fn plot_cross_distance(
    path: &Path,
    dates: &[DateTime<Utc>],
    cross: &CrossDistances,
) -> PlotResult {
    if cross.is_empty() || dates.is_empty() {
        return Ok(());
    }

    let height = 250 * cross.len() as u32;
    let root = BitMapBackend::new(path, (1200, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let years: Vec<f64> = dates.iter().map(|&d| decimal_year(d)).collect();
    let x_range = year_range(dates);
    let panels = root.split_evenly((cross.len(), 1));
    for (area, series) in panels.iter().zip(cross.iter()) {
        draw_transect_series(area, &years, series, x_range)?;
    }

    root.present()?;
    tracing::debug!(path = %path.display(), "saved cross-distance series");
    Ok(())
}

/// Continuous tide in grey with the tide at the acquisition times on top.
pub fn plot_tide_levels(
    path: &Path,
    continuous: &TideSeries,
    dates_sat: &[DateTime<Utc>],
    tide_sat: &[f64],
) -> PlotResult {
    let root = BitMapBackend::new(path, (1200, 300)).into_drawing_area();
    root.fill(&WHITE)?;

    let all_dates: Vec<DateTime<Utc>> = continuous.dates.iter().chain(dates_sat).copied().collect();
    let (x0, x1) = year_range(&all_dates);
    let (y0, y1) = axis_range(if continuous.is_empty() {
        tide_sat
    } else {
        &continuous.levels[..]
    });

    let mut chart = ChartBuilder::on(&root)
        .caption("Sub-sampled tide levels", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .y_desc("tide level [m]")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.1}"))
        .draw()?;

    chart.draw_series(LineSeries::new(
        continuous
            .dates
            .iter()
            .zip(&continuous.levels)
            .map(|(&d, &eta)| (decimal_year(d), eta)),
        RGBColor(153, 153, 153).stroke_width(1),
    ))?;

    let sampled: Vec<(f64, f64)> = dates_sat
        .iter()
        .zip(tide_sat)
        .filter(|(_, eta)| eta.is_finite())
        .map(|(&d, &eta)| (decimal_year(d), eta))
        .collect();
    chart.draw_series(LineSeries::new(sampled.clone(), BLACK.stroke_width(1)))?;
    chart.draw_series(sampled.iter().map(|&p| {
        EmptyElement::at(p) + Circle::new((0, 0), 3, WHITE.filled()) + Circle::new((0, 0), 3, BLACK)
    }))?;

    root.present()?;
    tracing::debug!(path = %path.display(), "saved tide levels");
    Ok(())
}

/// Histogram of the days between acquisitions, with ticks every `n_days`.
pub fn plot_timestep_distribution(path: &Path, dates: &[DateTime<Utc>], n_days: f64) -> PlotResult {
    let hist: Vec<(i64, usize)> = timestep_histogram(dates)
        .into_iter()
        .filter(|(day, _)| (0..50).contains(day))
        .collect();
    let max_count = hist.iter().map(|&(_, c)| c).max().unwrap_or(1) as f64;

    let root = BitMapBackend::new(path, (1200, 300)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Timestep distribution", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..50.0, 0.0..max_count * 1.1)?;

    let n_ticks = (50.0 / n_days.max(1.0)).floor() as usize + 1;
    chart
        .configure_mesh()
        .x_desc("timestep [days]")
        .y_desc("counts")
        .x_labels(n_ticks)
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;

    chart.draw_series(hist.iter().map(|&(day, count)| {
        let x = day as f64;
        Rectangle::new([(x - 0.5, 0.0), (x + 0.5, count as f64)], BLUE.mix(0.5).filled())
    }))?;
    chart.draw_series(hist.iter().map(|&(day, count)| {
        let x = day as f64;
        Rectangle::new([(x - 0.5, 0.0), (x + 0.5, count as f64)], BLACK.stroke_width(1))
    }))?;

    root.present()?;
    Ok(())
}
