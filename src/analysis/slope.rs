//! Beach slope estimation by minimising tidal energy.
//!
//! For each candidate slope β the tidally corrected series
//! `x + η/β` is transformed with Lomb-Scargle and its power integrated over
//! a narrow band around the aliased tidal frequency. The true slope removes
//! the tide from the shoreline series, so the candidate with the least band
//! energy is the estimate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::spectrum::{SpectrumError, find_peaks, frequency_grid, lomb_scargle_psd, simpson};
use super::{DateRange, SECONDS_IN_DAY, timestamp_seconds};

/// Error type for slope estimation.
#[derive(Debug, Error)]
pub enum SlopeError {
    /// Candidate slope range cannot be built
    #[error("Invalid slope range: min {min}, max {max}, step {delta}")]
    InvalidRange { min: f64, max: f64, delta: f64 },

    /// Series lengths disagree
    #[error("Length mismatch: {dates} dates, {values} values")]
    LengthMismatch { dates: usize, values: usize },

    /// No frequency band to integrate over
    #[error("No tidal frequency band set")]
    NoTidalBand,

    /// No spectral peak above the cutoff frequency
    #[error("No tidal peak above {cutoff:.3e} Hz")]
    NoTidalPeak { cutoff: f64 },

    /// Band holds too few grid frequencies to integrate
    #[error("Band [{low:.4e}, {high:.4e}] Hz contains {points} grid frequencies, need 2")]
    BandTooNarrow { low: f64, high: f64, points: usize },

    /// Not enough valid observations along a transect
    #[error("Transect {transect}: {found} valid points, need {needed}")]
    TooFewPoints {
        transect: String,
        found: usize,
        needed: usize,
    },

    /// Spectral computation failed
    #[error("Spectrum error: {0}")]
    Spectrum(#[from] SpectrumError),
}

impl SlopeError {
    /// Whether the error comes from one transect's data (too few or too
    /// closely spaced epochs) rather than from the settings.
    pub fn is_data_error(&self) -> bool {
        match self {
            SlopeError::TooFewPoints { .. } | SlopeError::BandTooNarrow { .. } => true,
            SlopeError::Spectrum(e) => matches!(
                e,
                SpectrumError::EmptyGrid { .. }
                    | SpectrumError::ZeroDuration
                    | SpectrumError::TooFewSamples { .. }
            ),
            SlopeError::InvalidRange { .. }
            | SlopeError::LengthMismatch { .. }
            | SlopeError::NoTidalBand
            | SlopeError::NoTidalPeak { .. } => false,
        }
    }
}

/// Frequency band around the tidal peak (Hz).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TidalBand {
    pub low: f64,
    pub high: f64,
}

impl TidalBand {
    /// Band of half-width `delta_f` centred on `frequency`.
    pub fn around(frequency: f64, delta_f: f64) -> Self {
        Self {
            low: frequency - delta_f,
            high: frequency + delta_f,
        }
    }

    /// Whether `f` lies in the band (inclusive).
    pub fn contains(&self, f: f64) -> bool {
        f >= self.low && f <= self.high
    }
}

/// Parameters for slope estimation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeSettings {
    /// Smallest candidate slope
    pub slope_min: f64,
    /// Largest candidate slope
    pub slope_max: f64,
    /// Candidate slope increment
    pub delta_slope: f64,
    /// Nominal sampling period in days
    pub n_days: f64,
    /// Frequency grid oversampling factor
    pub n0: usize,
    /// Lowest frequency at which the tidal peak is searched (Hz)
    pub freqs_cutoff: f64,
    /// Half-width of the band around the tidal peak (Hz)
    pub delta_f: f64,
    /// Fewest valid epochs a transect needs
    pub min_points: usize,
    /// Analysis period (exclusive bounds)
    pub date_range: DateRange,
    /// Tidal band; found from the tide spectrum when not set
    pub freqs_max: Option<TidalBand>,
}

impl Default for SlopeSettings {
    fn default() -> Self {
        // 1999-05-01 to 2020-01-01
        let start = DateTime::<Utc>::from_timestamp(925_516_800, 0).unwrap_or_default();
        let end = DateTime::<Utc>::from_timestamp(1_577_836_800, 0).unwrap_or_default();
        Self {
            slope_min: 0.035,
            slope_max: 0.2,
            delta_slope: 0.005,
            date_range: DateRange::new(start, end),
            n_days: 8.0,
            n0: 50,
            freqs_cutoff: 1.0 / (SECONDS_IN_DAY * 30.0),
            delta_f: 100.0 * 1e-10,
            freqs_max: None,
            min_points: 10,
        }
    }
}

impl SlopeSettings {
    /// Nominal sampling period in seconds.
    pub fn time_step(&self) -> f64 {
        self.n_days * SECONDS_IN_DAY
    }

    /// Candidate slopes.
    pub fn slopes(&self) -> Result<Vec<f64>, SlopeError> {
        range_slopes(self.slope_min, self.slope_max, self.delta_slope)
    }
}

/// Candidate slopes from `min` in steps of `delta`, covering `max`.
///
/// Values are appended while below `max`, then one more, so the last value
/// is at or just above `max`.
pub fn range_slopes(min: f64, max: f64, delta: f64) -> Result<Vec<f64>, SlopeError> {
    if !(delta > 0.0) || !(min > 0.0) || !max.is_finite() {
        return Err(SlopeError::InvalidRange { min, max, delta });
    }

    let mut slopes = Vec::new();
    let mut slope = min;
    while slope < max {
        slopes.push(slope);
        slope = min + slopes.len() as f64 * delta;
    }
    slopes.push(slope);
    Ok(slopes)
}

/// Tidally corrected series for each candidate slope: `chain + tide/slope`.
pub fn tide_correct(chain: &[f64], tide: &[f64], slopes: &[f64]) -> Vec<Vec<f64>> {
    slopes
        .iter()
        .map(|&slope| {
            chain
                .iter()
                .zip(tide)
                .map(|(&x, &eta)| x + eta / slope)
                .collect()
        })
        .collect()
}

/// Spectrum of the sampled tide and the band around its strongest peak.
#[derive(Clone, Debug)]
pub struct TidePeak {
    /// Band to integrate over
    pub band: TidalBand,
    /// Frequency of the peak (Hz)
    pub peak_frequency: f64,
    /// Frequency grid (Hz)
    pub freqs: Vec<f64>,
    /// PSD of the sampled tide
    pub power: Vec<f64>,
}

fn seconds(dates: &[DateTime<Utc>]) -> Vec<f64> {
    dates.iter().map(|&d| timestamp_seconds(d)).collect()
}

/// Index of the highest local maximum of `power` once everything below
/// `cutoff` is zeroed.
fn strongest_peak(freqs: &[f64], power: &[f64], cutoff: f64) -> Option<usize> {
    let masked: Vec<f64> = freqs
        .iter()
        .zip(power)
        .map(|(&f, &p)| if f < cutoff { 0.0 } else { p })
        .collect();

    find_peaks(&masked)
        .into_iter()
        .filter(|&i| masked[i] > 0.0)
        .max_by(|&a, &b| masked[a].total_cmp(&masked[b]))
}

/// Find the aliased tidal peak in the tide levels at the acquisition times.
///
/// The strongest spectral peak above `freqs_cutoff` is taken; lower
/// frequencies hold seasonal and long-term variability rather than the
/// aliased semi-diurnal signal.
pub fn find_tide_peak(
    dates: &[DateTime<Utc>],
    tide: &[f64],
    settings: &SlopeSettings,
) -> Result<TidePeak, SlopeError> {
    if dates.len() != tide.len() {
        return Err(SlopeError::LengthMismatch {
            dates: dates.len(),
            values: tide.len(),
        });
    }

    let t = seconds(dates);
    let freqs = frequency_grid(&t, settings.time_step(), settings.n0)?;
    let power = lomb_scargle_psd(&t, tide, &freqs)?;

    let peak = strongest_peak(&freqs, &power, settings.freqs_cutoff).ok_or(
        SlopeError::NoTidalPeak {
            cutoff: settings.freqs_cutoff,
        },
    )?;

    let peak_frequency = freqs[peak];
    tracing::info!(
        frequency = peak_frequency,
        period_days = 1.0 / (peak_frequency * SECONDS_IN_DAY),
        "tidal peak"
    );

    Ok(TidePeak {
        band: TidalBand::around(peak_frequency, settings.delta_f),
        peak_frequency,
        freqs,
        power,
    })
}

/// Band energy of each candidate slope.
#[derive(Clone, Debug)]
pub struct EnergyCurve {
    /// Candidate slopes
    pub slopes: Vec<f64>,
    /// Integrated PSD in the band, per candidate
    pub energy: Vec<f64>,
    /// Grid frequencies inside the band (Hz)
    pub band_freqs: Vec<f64>,
    /// PSD inside the band, per candidate
    pub band_spectra: Vec<Vec<f64>>,
}

impl EnergyCurve {
    /// Index of the candidate with the least energy.
    pub fn best_index(&self) -> Option<usize> {
        self.energy
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_nan())
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }

    /// Slope with the least energy.
    pub fn best_slope(&self) -> Option<f64> {
        self.best_index().map(|i| self.slopes[i])
    }
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
fn candidate_spectra(
    t: &[f64],
    tsall: &[Vec<f64>],
    freqs: &[f64],
) -> Result<Vec<Vec<f64>>, SpectrumError> {
    tsall.iter().map(|ts| lomb_scargle_psd(t, ts, freqs)).collect()
}

/// Parallel version of [`candidate_spectra`]; identical results.
#[cfg(feature = "parallel")]
fn candidate_spectra_parallel(
    t: &[f64],
    tsall: &[Vec<f64>],
    freqs: &[f64],
) -> Result<Vec<Vec<f64>>, SpectrumError> {
    use rayon::prelude::*;

    tsall
        .par_iter()
        .map(|ts| lomb_scargle_psd(t, ts, freqs))
        .collect()
}

/// Integrate the PSD of each corrected series over the tidal band.
///
/// `tsall` holds one series per candidate slope (see [`tide_correct`]) and
/// the band comes from `settings.freqs_max`. Only the grid frequencies in
/// the band are evaluated.
pub fn integrate_power_spectrum(
    dates: &[DateTime<Utc>],
    tsall: &[Vec<f64>],
    settings: &SlopeSettings,
) -> Result<EnergyCurve, SlopeError> {
    let band = settings.freqs_max.ok_or(SlopeError::NoTidalBand)?;
    let slopes = settings.slopes()?;
    if tsall.len() != slopes.len() {
        return Err(SlopeError::LengthMismatch {
            dates: slopes.len(),
            values: tsall.len(),
        });
    }

    let t = seconds(dates);
    let freqs = frequency_grid(&t, settings.time_step(), settings.n0)?;
    let band_freqs: Vec<f64> = freqs.into_iter().filter(|&f| band.contains(f)).collect();
    if band_freqs.len() < 2 {
        return Err(SlopeError::BandTooNarrow {
            low: band.low,
            high: band.high,
            points: band_freqs.len(),
        });
    }

    #[cfg(feature = "parallel")]
    let band_spectra = candidate_spectra_parallel(&t, tsall, &band_freqs)?;
    #[cfg(not(feature = "parallel"))]
    let band_spectra = candidate_spectra(&t, tsall, &band_freqs)?;

    let energy = band_spectra
        .iter()
        .map(|psd| simpson(psd, &band_freqs))
        .collect();

    Ok(EnergyCurve {
        slopes,
        energy,
        band_freqs,
        band_spectra,
    })
}

/// Slope estimate along one transect.
#[derive(Clone, Debug)]
pub struct SlopeEstimate {
    /// Transect identifier
    pub transect: String,
    /// Candidate slope with the least tidal energy
    pub slope: f64,
    /// Number of epochs used
    pub n_points: usize,
    /// Energy per candidate slope
    pub curve: EnergyCurve,
}

/// Estimate the beach slope along a transect.
///
/// Epochs where the chainage or tide is NaN are dropped first. Errors with
/// [`SlopeError::TooFewPoints`] when fewer than `settings.min_points` remain.
pub fn estimate_slope(
    transect: &str,
    dates: &[DateTime<Utc>],
    chain: &[f64],
    tide: &[f64],
    settings: &SlopeSettings,
) -> Result<SlopeEstimate, SlopeError> {
    if dates.len() != chain.len() || dates.len() != tide.len() {
        return Err(SlopeError::LengthMismatch {
            dates: dates.len(),
            values: chain.len().min(tide.len()),
        });
    }

    let mut valid_dates = Vec::with_capacity(dates.len());
    let mut valid_chain = Vec::with_capacity(dates.len());
    let mut valid_tide = Vec::with_capacity(dates.len());
    for ((&d, &x), &eta) in dates.iter().zip(chain).zip(tide) {
        if !x.is_nan() && !eta.is_nan() {
            valid_dates.push(d);
            valid_chain.push(x);
            valid_tide.push(eta);
        }
    }

    let n_points = valid_dates.len();
    if n_points < settings.min_points.max(3) {
        return Err(SlopeError::TooFewPoints {
            transect: transect.to_string(),
            found: n_points,
            needed: settings.min_points.max(3),
        });
    }

    let slopes = settings.slopes()?;
    let tsall = tide_correct(&valid_chain, &valid_tide, &slopes);
    let curve = integrate_power_spectrum(&valid_dates, &tsall, settings)?;
    let slope = curve.best_slope().ok_or(SlopeError::NoTidalBand)?;

    tracing::debug!(transect, slope, n_points, "estimated slope");

    Ok(SlopeEstimate {
        transect: transect.to_string(),
        slope,
        n_points,
        curve,
    })
}
