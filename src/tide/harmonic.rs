//! Harmonic tide model.
//!
//! The tide level is the sum of harmonic constituents about a reference
//! level:
//! ```text
//! η(t) = η₀ + Σᵢ Aᵢ cos(ωᵢ (t − t₀) + φᵢ)
//! ```
//! where t₀ is the model epoch.
//!
//! Constituents are either read from a constituent file or fitted to a tide
//! gauge record by least squares ([`HarmonicTideModel::calibrate`]). For the
//! fit the signal is written as
//! ```text
//! η(t) = η₀ + Σᵢ [aᵢ cos(ωᵢt) + bᵢ sin(ωᵢt)]
//! ```
//! which is linear in the unknowns; amplitude and phase are recovered as
//! `Aᵢ = √(aᵢ² + bᵢ²)` and `φᵢ = atan2(−bᵢ, aᵢ)`.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use faer::{Mat, linalg::solvers::Solve};

use super::{TideError, TideModel, TideSeries};
use crate::analysis::timestamp_seconds;
use crate::io::{ConstituentData, constituent_period};

/// Default largest allowed distance (degrees) between query and model location.
const DEFAULT_MAX_OFFSET_DEG: f64 = 0.5;

/// One harmonic constituent of a tide model.
#[derive(Clone, Debug, PartialEq)]
pub struct HarmonicConstituent {
    /// Name of the constituent (e.g., "M2", "S2")
    pub name: String,
    /// Amplitude (metres)
    pub amplitude: f64,
    /// Period (seconds)
    pub period: f64,
    /// Phase (radians) relative to the model epoch
    pub phase: f64,
}

impl HarmonicConstituent {
    /// Create a new constituent.
    pub fn new(name: impl Into<String>, amplitude: f64, period: f64, phase: f64) -> Self {
        Self {
            name: name.into(),
            amplitude,
            period,
            phase,
        }
    }

    /// Angular frequency ω = 2π/T.
    pub fn angular_frequency(&self) -> f64 {
        2.0 * PI / self.period
    }

    /// Evaluate the constituent `t` seconds after the epoch.
    pub fn evaluate(&self, t: f64) -> f64 {
        self.amplitude * (self.angular_frequency() * t + self.phase).cos()
    }
}

/// Tide model built from harmonic constituents at one location.
#[derive(Clone, Debug)]
pub struct HarmonicTideModel {
    /// (lon, lat) the constituents describe, if known
    pub location: Option<(f64, f64)>,
    /// Mean water level (metres)
    pub reference_level: f64,
    /// Instant the phases refer to
    pub epoch: DateTime<Utc>,
    /// Constituents
    pub constituents: Vec<HarmonicConstituent>,
    /// Largest allowed offset (degrees) between a query and `location`
    pub max_offset_deg: f64,
}

impl HarmonicTideModel {
    /// Create a model with no location check.
    pub fn new(
        reference_level: f64,
        epoch: DateTime<Utc>,
        constituents: Vec<HarmonicConstituent>,
    ) -> Self {
        Self {
            location: None,
            reference_level,
            epoch,
            constituents,
            max_offset_deg: DEFAULT_MAX_OFFSET_DEG,
        }
    }

    /// Build a model from parsed constituent file data.
    pub fn from_constituents(data: &ConstituentData) -> Self {
        let constituents = data
            .constituents
            .iter()
            .map(|c| {
                HarmonicConstituent::new(c.name.clone(), c.amplitude, c.period, c.phase_radians())
            })
            .collect();

        Self {
            location: data.location,
            ..Self::new(data.reference_level, data.epoch, constituents)
        }
    }

    /// Set the model location.
    pub fn with_location(mut self, lon: f64, lat: f64) -> Self {
        self.location = Some((lon, lat));
        self
    }

    /// Set the largest allowed query offset in degrees.
    pub fn with_max_offset(mut self, degrees: f64) -> Self {
        self.max_offset_deg = degrees;
        self
    }

    /// Tide level at a time, without a location check.
    pub fn evaluate(&self, date: DateTime<Utc>) -> f64 {
        let t = timestamp_seconds(date) - timestamp_seconds(self.epoch);
        self.reference_level
            + self
                .constituents
                .iter()
                .map(|c| c.evaluate(t))
                .sum::<f64>()
    }

    /// Get a constituent by name.
    pub fn get_constituent(&self, name: &str) -> Option<&HarmonicConstituent> {
        self.constituents
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Minimum record length needed to separate the given constituents (Rayleigh criterion).
    ///
    /// Two constituents with periods T₁ and T₂ need a record longer than
    /// 1 / |1/T₁ − 1/T₂|. Returns the longest such length over all pairs.
    pub fn minimum_record_length(periods: &[f64]) -> f64 {
        let mut min_length: f64 = 0.0;
        for i in 0..periods.len() {
            for j in (i + 1)..periods.len() {
                let df = (1.0 / periods[i] - 1.0 / periods[j]).abs();
                if df > 1e-12 {
                    min_length = min_length.max(1.0 / df);
                }
            }
        }
        min_length
    }

    /// Fit constituents to a tide record by least squares.
    ///
    /// Phases are referenced to `epoch`. Constituent names must be known to
    /// [`constituent_period`]. The record must have more samples than
    /// unknowns (1 + 2 per constituent).
    pub fn calibrate(
        record: &TideSeries,
        names: &[&str],
        epoch: DateTime<Utc>,
    ) -> Result<Self, TideError> {
        let periods = names
            .iter()
            .map(|name| {
                constituent_period(name)
                    .ok_or_else(|| TideError::Calibration(format!("unknown constituent {name}")))
            })
            .collect::<Result<Vec<f64>, TideError>>()?;

        let n_data = record.len();
        let n_unknowns = 1 + 2 * periods.len();
        if n_data <= n_unknowns {
            return Err(TideError::Calibration(format!(
                "need more than {n_unknowns} samples to fit {} constituents, got {n_data}",
                periods.len()
            )));
        }

        let duration = record
            .dates
            .iter()
            .zip(record.dates.iter().skip(1))
            .map(|(a, b)| (*b - *a).num_seconds() as f64)
            .sum::<f64>();
        let rayleigh = Self::minimum_record_length(&periods);
        if duration < rayleigh {
            tracing::warn!(
                duration_days = duration / 86400.0,
                required_days = rayleigh / 86400.0,
                "tide record shorter than the Rayleigh criterion, constituents may not separate"
            );
        }

        let t0 = timestamp_seconds(epoch);
        let times: Vec<f64> = record
            .dates
            .iter()
            .map(|&d| timestamp_seconds(d) - t0)
            .collect();
        let omegas: Vec<f64> = periods.iter().map(|p| 2.0 * PI / p).collect();

        // Design matrix A = [1, cos(ω₁t), sin(ω₁t), cos(ω₂t), sin(ω₂t), ...]
        let mut a = Mat::<f64>::zeros(n_data, n_unknowns);
        for (i, &t) in times.iter().enumerate() {
            a[(i, 0)] = 1.0;
            for (j, &omega) in omegas.iter().enumerate() {
                a[(i, 1 + 2 * j)] = (omega * t).cos();
                a[(i, 2 + 2 * j)] = (omega * t).sin();
            }
        }

        // Normal equations (A'A) x = A'y
        let mut ata = Mat::<f64>::zeros(n_unknowns, n_unknowns);
        for i in 0..n_unknowns {
            for j in i..n_unknowns {
                let mut sum = 0.0;
                for k in 0..n_data {
                    sum += a[(k, i)] * a[(k, j)];
                }
                ata[(i, j)] = sum;
                ata[(j, i)] = sum;
            }
        }

        let mut aty = Mat::<f64>::zeros(n_unknowns, 1);
        for i in 0..n_unknowns {
            let mut sum = 0.0;
            for k in 0..n_data {
                sum += a[(k, i)] * record.levels[k];
            }
            aty[(i, 0)] = sum;
        }

        let lu = ata.as_ref().full_piv_lu();
        let x = lu.solve(&aty);

        if (0..n_unknowns).any(|i| !x[(i, 0)].is_finite()) {
            return Err(TideError::Calibration(
                "singular system, check record length and constituents".into(),
            ));
        }

        let constituents = names
            .iter()
            .zip(&periods)
            .enumerate()
            .map(|(j, (name, &period))| {
                let a_coef = x[(1 + 2 * j, 0)];
                let b_coef = x[(2 + 2 * j, 0)];
                let amplitude = a_coef.hypot(b_coef);
                let mut phase = (-b_coef).atan2(a_coef);
                if phase < 0.0 {
                    phase += 2.0 * PI;
                }
                HarmonicConstituent::new(name.to_uppercase(), amplitude, period, phase)
            })
            .collect();

        Ok(Self::new(x[(0, 0)], epoch, constituents))
    }
}

impl TideModel for HarmonicTideModel {
    fn describe(&self) -> String {
        let names: Vec<&str> = self.constituents.iter().map(|c| c.name.as_str()).collect();
        format!("harmonic model ({})", names.join(", "))
    }

    fn tide_level(&self, location: (f64, f64), date: DateTime<Utc>) -> Result<f64, TideError> {
        if let Some((lon, lat)) = self.location {
            let offset = (location.0 - lon).hypot(location.1 - lat);
            if offset > self.max_offset_deg {
                return Err(TideError::LocationMismatch {
                    lon: location.0,
                    lat: location.1,
                    offset,
                });
            }
        }
        Ok(self.evaluate(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const TOL: f64 = 1e-10;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
    }

    fn m2_s2_model() -> HarmonicTideModel {
        let m2 = constituent_period("M2").unwrap();
        let s2 = constituent_period("S2").unwrap();
        HarmonicTideModel::new(
            0.1,
            epoch(),
            vec![
                HarmonicConstituent::new("M2", 0.5, m2, 0.7),
                HarmonicConstituent::new("S2", 0.12, s2, 2.1),
            ],
        )
    }

    #[test]
    fn test_evaluate_at_epoch() {
        let model = m2_s2_model();
        let expected = 0.1 + 0.5 * 0.7_f64.cos() + 0.12 * 2.1_f64.cos();
        assert!((model.evaluate(epoch()) - expected).abs() < TOL);
    }

    #[test]
    fn test_evaluate_is_periodic() {
        let period = constituent_period("S2").unwrap();
        let s2 = HarmonicConstituent::new("S2", 1.0, period, 0.3);
        let model = HarmonicTideModel::new(0.0, epoch(), vec![s2]);
        let later = epoch() + Duration::hours(12);
        assert!((model.evaluate(epoch()) - model.evaluate(later)).abs() < 1e-9);
    }

    #[test]
    fn test_location_check() {
        let model = m2_s2_model().with_location(151.33, -33.72);

        assert!(model.tide_level((151.34, -33.72), epoch()).is_ok());
        assert!(matches!(
            model.tide_level((150.0, -33.72), epoch()),
            Err(TideError::LocationMismatch { .. })
        ));
    }

    #[test]
    fn test_calibrate_recovers_constituents() {
        let truth = m2_s2_model();
        let mut record = TideSeries::default();
        // 30 days of hourly data
        for i in 0..(30 * 24) {
            let date = epoch() + Duration::hours(i);
            record.push(date, truth.evaluate(date));
        }

        let fitted = HarmonicTideModel::calibrate(&record, &["M2", "S2"], epoch()).unwrap();

        assert!((fitted.reference_level - 0.1).abs() < 1e-6);
        let m2 = fitted.get_constituent("M2").unwrap();
        assert!((m2.amplitude - 0.5).abs() < 1e-6);
        assert!((m2.phase - 0.7).abs() < 1e-6);
        let s2 = fitted.get_constituent("s2").unwrap();
        assert!((s2.amplitude - 0.12).abs() < 1e-6);
        assert!((s2.phase - 2.1).abs() < 1e-6);
    }

    #[test]
    fn test_calibrate_errors() {
        let mut record = TideSeries::default();
        record.push(epoch(), 0.0);
        assert!(HarmonicTideModel::calibrate(&record, &["M2"], epoch()).is_err());
        assert!(HarmonicTideModel::calibrate(&record, &["XX"], epoch()).is_err());
    }

    #[test]
    fn test_rayleigh_m2_s2() {
        let periods = [
            constituent_period("M2").unwrap(),
            constituent_period("S2").unwrap(),
        ];
        let days = HarmonicTideModel::minimum_record_length(&periods) / 86400.0;
        assert!((days - 14.77).abs() < 0.05);
    }
}
