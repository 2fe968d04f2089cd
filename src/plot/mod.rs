//! PNG figures of each stage of the analysis.
//!
//! Figures are drawn with plotters onto bitmap backends. Drawing is a side
//! effect only; nothing here feeds back into the estimate.
//!
//! | File | Content |
//! |------|---------|
//! | `shorelines.png` | shorelines and transects in map view |
//! | `cross_distance.png` | cross-shore distance series per transect |
//! | `tide_levels.png` | continuous tide and tide at acquisition times |
//! | `timestep_distribution.png` | histogram of days between acquisitions |
//! | `tide_spectrum.png` | spectrum of the sampled tide and the tidal band |
//! | `spectrum_<transect>.png` | spectra and band energy against slope |

mod maps;
mod series;
mod spectra;

pub use maps::plot_shorelines;
pub use series::{plot_cross_distance, plot_tide_levels, plot_timestep_distribution};
pub use spectra::{plot_tide_spectrum, plot_transect_spectrum};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::analysis::{SECONDS_IN_DAY, timestamp_seconds};
use crate::tide::get_min_max;

/// Result of drawing a figure.
pub type PlotResult = Result<(), Box<dyn std::error::Error>>;

/// Create the plot directory if needed and return the path of a figure in it.
pub fn figure_path(plot_dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(plot_dir)?;
    Ok(plot_dir.join(name))
}

/// Histogram of the time between consecutive acquisitions.
///
/// Steps are binned to the nearest whole day. Returns `(day, count)` for every
/// day from the shortest to the longest step, including empty bins.
pub fn timestep_histogram(dates: &[DateTime<Utc>]) -> Vec<(i64, usize)> {
    let steps: Vec<i64> = dates
        .windows(2)
        .map(|w| {
            let step = timestamp_seconds(w[1]) - timestamp_seconds(w[0]);
            (step / SECONDS_IN_DAY).round() as i64
        })
        .collect();

    let (Some(&lo), Some(&hi)) = (steps.iter().min(), steps.iter().max()) else {
        return Vec::new();
    };

    let mut counts = vec![0usize; (hi - lo + 1) as usize];
    for step in steps {
        counts[(step - lo) as usize] += 1;
    }
    (lo..=hi).zip(counts).collect()
}

/// Axis range of a series, falling back to `[0, 1]` when it has no finite value.
fn axis_range(values: &[f64]) -> (f64, f64) {
    match get_min_max(values) {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, _)) => (lo - 0.5, lo + 0.5),
        None => (0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(d * 86_400 + 3_600, 0).unwrap()
    }

    #[test]
    fn test_timestep_histogram() {
        let dates = vec![day(0), day(8), day(16), day(32), day(40)];
        let hist = timestep_histogram(&dates);

        assert_eq!(hist.first(), Some(&(8, 3)));
        assert_eq!(hist.last(), Some(&(16, 1)));
        assert_eq!(hist.len(), 9);
        assert_eq!(hist.iter().map(|(_, c)| c).sum::<usize>(), 4);
    }

    #[test]
    fn test_timestep_histogram_too_few_dates() {
        assert!(timestep_histogram(&[day(0)]).is_empty());
    }

    #[test]
    fn test_axis_range() {
        assert_eq!(axis_range(&[f64::NAN]), (0.0, 1.0));
        assert_eq!(axis_range(&[2.0, 2.0]), (1.5, 2.5));
    }

    #[test]
    fn test_figure_path_creates_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let plot_dir = dir.path().join("plots");
        let path = figure_path(&plot_dir, "a.png").unwrap();
        assert!(plot_dir.is_dir());
        assert_eq!(path, plot_dir.join("a.png"));
    }
}
