//! Shoreline analysis: filtering, transect intersection, outlier rejection,
//! spectral analysis and beach slope estimation.
//!
//! # Method
//!
//! A satellite sees the shoreline at whatever the tide level was when the
//! image was taken. On a beach of slope β a tide level η moves the
//! shoreline horizontally by η/β, so the cross-shore series x(t) carries the
//! tidal signal. Correcting with a candidate slope,
//! ```text
//! x̂(t) = x(t) + η(t) / β
//! ```
//! removes the tidal signal only when β is the true slope. The estimate is the
//! candidate that minimises the spectral energy of x̂ in a narrow band around
//! the aliased tidal peak of the sampled tide series.
//!
//! # Example
//!
//! ```ignore
//! use slope_rs::analysis::{compute_intersection, estimate_slope, find_tide_peak, reject_outliers};
//!
//! let mut cross = compute_intersection(&dataset, &transects, &settings_transects);
//! reject_outliers(&mut cross, &settings_transects);
//! settings_slope.freqs_max = Some(find_tide_peak(&dates, &tide, &settings_slope)?.band);
//! let est = estimate_slope("NA1", &dates, cross.get("NA1").unwrap(), &tide, &settings_slope)?;
//! ```

mod filter;
mod intersection;
mod outliers;
mod slope;
mod spectrum;

pub use filter::{clip_dates, remove_duplicates, remove_inaccurate_georef, remove_satellite};
pub use intersection::{
    CrossDistances, IntersectionSettings, OutlierMode, TransectSeries, compute_intersection,
};
pub use outliers::{identify_outliers, reject_outliers};
pub use slope::{
    EnergyCurve, SlopeError, SlopeEstimate, SlopeSettings, TidalBand, TidePeak, estimate_slope,
    find_tide_peak, integrate_power_spectrum, range_slopes, tide_correct,
};
pub use spectrum::{
    SpectrumError, find_peaks, frequency_grid, lomb_scargle_psd, simpson,
};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Seconds in a day.
pub const SECONDS_IN_DAY: f64 = 24.0 * 3600.0;

/// Open time interval `(start, end)`.
///
/// Both bounds are exclusive: a date equal to either bound is outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Lower bound (exclusive)
    pub start: DateTime<Utc>,
    /// Upper bound (exclusive)
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Create a range.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `date` lies strictly between the bounds.
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        date > self.start && date < self.end
    }
}

/// Unix time in seconds with sub-second precision.
pub fn timestamp_seconds(date: DateTime<Utc>) -> f64 {
    date.timestamp() as f64 + f64::from(date.timestamp_subsec_nanos()) * 1e-9
}

/// Decimal year (e.g. 2004.5), used for plot axes.
pub fn decimal_year(date: DateTime<Utc>) -> f64 {
    let year = date.year();
    let start = DateTime::<Utc>::from_naive_utc_and_offset(
        chrono::NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default(),
        Utc,
    );
    let days_in_year = if chrono::NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    };
    let elapsed = timestamp_seconds(date) - timestamp_seconds(start);
    year as f64 + elapsed / (days_in_year * SECONDS_IN_DAY)
}
