//! Map view of shorelines and transects.

use std::path::Path;

use plotters::prelude::*;

use super::PlotResult;
use crate::io::{ShorelineDataset, Transect};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 800;

/// Extent of all points, padded so x and y have the same scale on the figure.
fn equal_aspect_extent(
    points: impl Iterator<Item = (f64, f64)>,
) -> Option<((f64, f64), (f64, f64))> {
    let (mut x0, mut x1) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in points.filter(|(x, y)| x.is_finite() && y.is_finite()) {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }
    if !x0.is_finite() {
        return None;
    }

    let aspect = WIDTH as f64 / HEIGHT as f64;
    let (cx, cy) = (0.5 * (x0 + x1), 0.5 * (y0 + y1));
    let half_h = (0.5 * (y1 - y0)).max(0.5 * (x1 - x0) / aspect).max(1.0) * 1.05;
    let half_w = half_h * aspect;
    Some(((cx - half_w, cx + half_w), (cy - half_h, cy + half_h)))
}

/// Shoreline points of every record, one colour per image, with the transects on top.
pub fn plot_shorelines(
    path: &Path,
    site: &str,
    dataset: &ShorelineDataset,
    transects: &[Transect],
) -> PlotResult {
    let points = dataset
        .records
        .iter()
        .flat_map(|r| r.shoreline.iter().map(|c| (c.x, c.y)))
        .chain(transects.iter().flat_map(|t| [(t.origin.x, t.origin.y), (t.end.x, t.end.y)]));
    let Some(((x0, x1), (y0, y1))) = equal_aspect_extent(points) else {
        tracing::warn!("no shoreline points to plot");
        return Ok(());
    };

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(site, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("Eastings [m]")
        .y_desc("Northings [m]")
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;

    for (i, record) in dataset.records.iter().enumerate() {
        let style = Palette99::pick(i).mix(0.6).filled();
        chart.draw_series(
            record
                .shoreline
                .iter()
                .map(|c| Circle::new((c.x, c.y), 1, style)),
        )?;
    }

    for transect in transects {
        chart.draw_series(LineSeries::new(
            vec![(transect.origin.x, transect.origin.y), (transect.end.x, transect.end.y)],
            BLACK.stroke_width(2),
        ))?;
        chart.draw_series(std::iter::once(Text::new(
            transect.name.clone(),
            (transect.end.x, transect.end.y),
            ("sans-serif", 16).into_font(),
        )))?;
    }

    root.present()?;
    tracing::debug!(path = %path.display(), "saved shoreline map");
    Ok(())
}
