//! Power spectrum figures.

use std::path::Path;

use chrono::{DateTime, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::{PlotResult, axis_range};
use crate::analysis::{
    SECONDS_IN_DAY, SlopeEstimate, SlopeSettings, TidalBand, TidePeak, frequency_grid,
    lomb_scargle_psd, timestamp_seconds,
};

/// Frequencies are drawn in cycles per day.
fn per_day(f: f64) -> f64 {
    f * SECONDS_IN_DAY
}

fn draw_spectrum(
    area: &DrawingArea<BitMapBackend, Shift>,
    title: &str,
    freqs: &[f64],
    spectra: &[(&[f64], RGBColor, &str)],
    band: TidalBand,
) -> PlotResult {
    let x0 = freqs.first().copied().map(per_day).unwrap_or(0.0);
    let x1 = freqs.last().copied().map(per_day).unwrap_or(1.0);
    let all: Vec<f64> = spectra.iter().flat_map(|(p, _, _)| p.iter().copied()).collect();
    let (_, y1) = axis_range(&all);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, 0.0..y1)?;

    chart
        .configure_mesh()
        .x_desc("frequency [1/day]")
        .y_desc("PSD")
        .x_label_formatter(&|x| format!("{x:.3}"))
        .y_label_formatter(&|y| format!("{y:.1e}"))
        .draw()?;

    chart.draw_series(std::iter::once(Rectangle::new(
        [(per_day(band.low), 0.0), (per_day(band.high), y1)],
        RED.mix(0.2).filled(),
    )))?;

    for &(power, color, label) in spectra {
        chart
            .draw_series(LineSeries::new(
                freqs.iter().zip(power).map(|(&f, &p)| (per_day(f), p)),
                color.stroke_width(1),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Spectrum of the tide at the acquisition times with the tidal band shaded.
pub fn plot_tide_spectrum(path: &Path, peak: &TidePeak, band: TidalBand) -> PlotResult {
    let root = BitMapBackend::new(path, (1200, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!(
        "Sub-sampled tide spectrum, peak period {:.1} days",
        1.0 / per_day(peak.peak_frequency)
    );
    draw_spectrum(
        &root,
        &title,
        &peak.freqs,
        &[(&peak.power[..], BLACK, "tide")],
        band,
    )?;

    root.present()?;
    tracing::debug!(path = %path.display(), "saved tide spectrum");
    Ok(())
}

/// Spectra before and after the best tidal correction, the candidate
/// spectra inside the band, and band energy against slope.
///
/// `dates`, `chain` and `tide` are the full series of the transect; epochs
/// with NaN are dropped as in the estimate.
pub fn plot_transect_spectrum(
    path: &Path,
    estimate: &SlopeEstimate,
    dates: &[DateTime<Utc>],
    chain: &[f64],
    tide: &[f64],
    settings: &SlopeSettings,
) -> PlotResult {
    let Some(band) = settings.freqs_max else {
        return Ok(());
    };

    let (mut t, mut raw, mut corrected) = (Vec::new(), Vec::new(), Vec::new());
    for ((&d, &x), &eta) in dates.iter().zip(chain).zip(tide) {
        if !x.is_nan() && !eta.is_nan() {
            t.push(timestamp_seconds(d));
            raw.push(x);
            corrected.push(x + eta / estimate.slope);
        }
    }

    let freqs = frequency_grid(&t, settings.time_step(), settings.n0)?;
    let raw_psd = lomb_scargle_psd(&t, &raw, &freqs)?;
    let corrected_psd = lomb_scargle_psd(&t, &corrected, &freqs)?;

    let root = BitMapBackend::new(path, (1200, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(450);
    let lower = lower.split_evenly((1, 2));

    let best_label = format!("corrected, slope {:.3}", estimate.slope);
    draw_spectrum(
        &upper,
        &format!("Transect {}", estimate.transect),
        &freqs,
        &[
            (&raw_psd[..], RGBColor(128, 128, 128), "uncorrected"),
            (&corrected_psd[..], BLUE, best_label.as_str()),
        ],
        band,
    )?;

    draw_band_spectra(&lower[0], estimate, band)?;
    draw_energy_curve(&lower[1], estimate)?;

    root.present()?;
    tracing::debug!(path = %path.display(), "saved transect spectrum");
    Ok(())
}

fn draw_band_spectra(
    area: &DrawingArea<BitMapBackend, Shift>,
    estimate: &SlopeEstimate,
    band: TidalBand,
) -> PlotResult {
    let curve = &estimate.curve;
    let all: Vec<f64> = curve.band_spectra.iter().flatten().copied().collect();
    let (_, y1) = axis_range(&all);

    let mut chart = ChartBuilder::on(area)
        .caption("Tidal band", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(per_day(band.low)..per_day(band.high), 0.0..y1)?;

    chart
        .configure_mesh()
        .x_desc("frequency [1/day]")
        .y_desc("PSD")
        .x_labels(4)
        .x_label_formatter(&|x| format!("{x:.5}"))
        .y_label_formatter(&|y| format!("{y:.1e}"))
        .draw()?;

    let n = curve.band_spectra.len().max(2) - 1;
    for (i, psd) in curve.band_spectra.iter().enumerate() {
        let color = HSLColor(0.7 * i as f64 / n as f64, 0.8, 0.45);
        chart.draw_series(LineSeries::new(
            curve.band_freqs.iter().zip(psd).map(|(&f, &p)| (per_day(f), p)),
            color.stroke_width(1),
        ))?;
    }
    Ok(())
}

fn draw_energy_curve(
    area: &DrawingArea<BitMapBackend, Shift>,
    estimate: &SlopeEstimate,
) -> PlotResult {
    let curve = &estimate.curve;
    let (x0, x1) = axis_range(&curve.slopes);
    let (y0, y1) = axis_range(&curve.energy);

    let mut chart = ChartBuilder::on(area)
        .caption("Band energy", ("sans-serif", 20))
        .margin(5)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("slope")
        .y_desc("energy")
        .x_label_formatter(&|x| format!("{x:.3}"))
        .y_label_formatter(&|y| format!("{y:.1e}"))
        .draw()?;

    let points: Vec<(f64, f64)> = curve
        .slopes
        .iter()
        .copied()
        .zip(curve.energy.iter().copied())
        .collect();
    chart.draw_series(LineSeries::new(points.clone(), BLACK.stroke_width(1)))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, BLACK.filled())))?;

    if let Some(best) = curve.best_index() {
        chart.draw_series(std::iter::once(Circle::new(points[best], 6, RED.filled())))?;
    }
    Ok(())
}
