//! Pre-computed tide levels.
//!
//! Used when tide levels have been computed elsewhere (another tide model or
//! a nearby gauge) and saved to a tide file. Levels between samples are
//! linearly interpolated; the location is ignored.

use chrono::{DateTime, Duration, Utc};

use super::{TideError, TideModel, TideSeries};
use crate::analysis::{DateRange, timestamp_seconds};

/// Tide record that is interpolated in time.
#[derive(Clone, Debug)]
pub struct PrecomputedTide {
    series: TideSeries,
    label: String,
}

impl PrecomputedTide {
    /// Create from a tide series. Samples are sorted by time.
    pub fn new(series: TideSeries, label: impl Into<String>) -> Self {
        let mut samples: Vec<(DateTime<Utc>, f64)> =
            series.dates.into_iter().zip(series.levels).collect();
        samples.sort_by_key(|(date, _)| *date);
        let (dates, levels) = samples.into_iter().unzip();

        Self {
            series: TideSeries { dates, levels },
            label: label.into(),
        }
    }

    /// Interpolated level at a time.
    pub fn interpolate(&self, date: DateTime<Utc>) -> Result<f64, TideError> {
        let dates = &self.series.dates;
        let levels = &self.series.levels;

        let (first, last) = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(TideError::OutsideRecord(date)),
        };
        if date < first || date > last {
            return Err(TideError::OutsideRecord(date));
        }

        // First sample at or after `date`
        let upper = dates.partition_point(|d| *d < date);
        if dates[upper] == date {
            return Ok(levels[upper]);
        }

        let lower = upper - 1;
        let t0 = timestamp_seconds(dates[lower]);
        let t1 = timestamp_seconds(dates[upper]);
        let w = (timestamp_seconds(date) - t0) / (t1 - t0);
        Ok(levels[lower] + w * (levels[upper] - levels[lower]))
    }
}

impl TideModel for PrecomputedTide {
    fn describe(&self) -> String {
        format!("pre-computed tide ({}, {} samples)", self.label, self.series.len())
    }

    fn tide_level(&self, _location: (f64, f64), date: DateTime<Utc>) -> Result<f64, TideError> {
        self.interpolate(date)
    }

    /// The recorded samples inside the range; the time step is not used.
    fn series(
        &self,
        _location: (f64, f64),
        range: &DateRange,
        _time_step: Duration,
    ) -> Result<TideSeries, TideError> {
        Ok(self.series.clip(range))
    }
}
