//! Tide levels at the beach.
//!
//! Tide levels come from a [`TideModel`]: either a harmonic model evaluated
//! from constituents ([`HarmonicTideModel`]) or a pre-computed record that is
//! interpolated in time ([`PrecomputedTide`]). Two series are derived from a
//! model:
//!
//! - a continuous series on a regular time step over the analysis period
//!   ([`compute_tide`]), used for plotting, and
//! - the tide level at each satellite acquisition time
//!   ([`compute_tide_dates`]), used for the tidal correction.
//!
//! The tide location should be an ocean point 1-2 km offshore of the beach.
//!
//! # Example
//!
//! ```ignore
//! use slope_rs::io::read_constituent_file;
//! use slope_rs::tide::{compute_tide_dates, HarmonicTideModel};
//!
//! let model = HarmonicTideModel::from_constituents(&read_constituent_file(path)?);
//! let tide_sat = compute_tide_dates(&model, (151.332209, -33.723772), &dates)?;
//! ```

mod harmonic;
mod precomputed;

pub use harmonic::{HarmonicConstituent, HarmonicTideModel};
pub use precomputed::PrecomputedTide;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::analysis::DateRange;

/// Error type for tide computations.
#[derive(Debug, Error)]
pub enum TideError {
    /// Query location is too far from the location the model describes
    #[error("Location ({lon:.4}, {lat:.4}) is {offset:.3}° from the tide model location")]
    LocationMismatch { lon: f64, lat: f64, offset: f64 },

    /// Query time outside the record of a pre-computed tide
    #[error("No tide data at {0}: outside the tide record")]
    OutsideRecord(DateTime<Utc>),

    /// Time step must be positive
    #[error("Invalid time step: {0} s")]
    InvalidTimeStep(f64),

    /// Harmonic calibration failed
    #[error("Calibration failed: {0}")]
    Calibration(String),
}

/// A source of tide levels.
pub trait TideModel {
    /// Short description used in log messages.
    fn describe(&self) -> String;

    /// Tide level in metres at a (lon, lat) location and time.
    fn tide_level(&self, location: (f64, f64), date: DateTime<Utc>) -> Result<f64, TideError>;

    /// Continuous tide series over a date range.
    ///
    /// The default samples [`TideModel::tide_level`] every `time_step`.
    fn series(
        &self,
        location: (f64, f64),
        range: &DateRange,
        time_step: Duration,
    ) -> Result<TideSeries, TideError> {
        let step_seconds = time_step.num_milliseconds() as f64 / 1000.0;
        if step_seconds <= 0.0 {
            return Err(TideError::InvalidTimeStep(step_seconds));
        }

        let mut series = TideSeries::default();
        let mut date = range.start;
        while date <= range.end {
            series.push(date, self.tide_level(location, date)?);
            date += time_step;
        }
        Ok(series)
    }
}

/// Tide levels at a sequence of times.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TideSeries {
    /// Sample times
    pub dates: Vec<DateTime<Utc>>,
    /// Tide level at each time (metres)
    pub levels: Vec<f64>,
}

impl TideSeries {
    /// Create a series from parallel vectors.
    ///
    /// # Panics
    ///
    /// Panics if `dates` and `levels` have different lengths.
    pub fn new(dates: Vec<DateTime<Utc>>, levels: Vec<f64>) -> Self {
        assert_eq!(
            dates.len(),
            levels.len(),
            "dates and levels must have same length"
        );
        Self { dates, levels }
    }

    /// Append a sample.
    pub fn push(&mut self, date: DateTime<Utc>, level: f64) {
        self.dates.push(date);
        self.levels.push(level);
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Samples strictly inside a date range.
    pub fn clip(&self, range: &DateRange) -> TideSeries {
        let mut clipped = TideSeries::default();
        for (date, level) in self.dates.iter().zip(&self.levels) {
            if range.contains(*date) {
                clipped.push(*date, *level);
            }
        }
        clipped
    }
}

/// Continuous tide series from `range.start` to `range.end` (inclusive) every `time_step`.
pub fn compute_tide<M: TideModel + ?Sized>(
    model: &M,
    location: (f64, f64),
    range: &DateRange,
    time_step: Duration,
) -> Result<TideSeries, TideError> {
    model.series(location, range, time_step)
}

/// Tide level at each of the given times.
pub fn compute_tide_dates<M: TideModel + ?Sized>(
    model: &M,
    location: (f64, f64),
    dates: &[DateTime<Utc>],
) -> Result<Vec<f64>, TideError> {
    dates
        .iter()
        .map(|&date| model.tide_level(location, date))
        .collect()
}

/// Plot limits for a series: its range padded by 5% on each side.
///
/// NaN values are ignored. Returns `None` when there is no finite value.
pub fn get_min_max(values: &[f64]) -> Option<(f64, f64)> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() {
        return None;
    }
    let pad = 0.05 * (max - min);
    Some((min - pad, max + pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Ramp;

    impl TideModel for Ramp {
        fn describe(&self) -> String {
            "ramp".into()
        }

        fn tide_level(&self, _location: (f64, f64), date: DateTime<Utc>) -> Result<f64, TideError> {
            Ok(date.timestamp() as f64 / 3600.0)
        }
    }

    fn range_hours(hours: i64) -> DateRange {
        let start = Utc.timestamp_opt(0, 0).unwrap();
        DateRange::new(start, start + Duration::hours(hours))
    }

    #[test]
    fn test_compute_tide_includes_end() {
        let series =
            compute_tide(&Ramp, (0.0, 0.0), &range_hours(2), Duration::minutes(15)).unwrap();

        assert_eq!(series.len(), 9);
        assert_eq!(series.levels[0], 0.0);
        assert_eq!(series.levels[8], 2.0);
    }

    #[test]
    fn test_compute_tide_rejects_zero_step() {
        let result = compute_tide(&Ramp, (0.0, 0.0), &range_hours(2), Duration::zero());
        assert!(matches!(result, Err(TideError::InvalidTimeStep(_))));
    }

    #[test]
    fn test_compute_tide_dates() {
        let dates = vec![
            Utc.timestamp_opt(3600, 0).unwrap(),
            Utc.timestamp_opt(7200, 0).unwrap(),
        ];
        let levels = compute_tide_dates(&Ramp, (0.0, 0.0), &dates).unwrap();
        assert_eq!(levels, vec![1.0, 2.0]);
    }

    #[test]
    fn test_get_min_max() {
        let (lo, hi) = get_min_max(&[1.0, f64::NAN, 3.0]).unwrap();
        assert!((lo - 0.9).abs() < 1e-12);
        assert!((hi - 3.1).abs() < 1e-12);

        assert!(get_min_max(&[f64::NAN]).is_none());
        assert!(get_min_max(&[]).is_none());
    }

    #[test]
    fn test_clip_is_exclusive() {
        let series = compute_tide(&Ramp, (0.0, 0.0), &range_hours(4), Duration::hours(1)).unwrap();
        let clipped = series.clip(&range_hours(2));
        assert_eq!(clipped.levels, vec![1.0]);
    }
}
