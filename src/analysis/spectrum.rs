//! Spectral analysis of unevenly sampled series.
//!
//! Satellite shorelines are sampled at irregular intervals (revisit times,
//! cloud cover, missions starting and stopping), so power spectra are
//! computed with the Lomb-Scargle periodogram rather than an FFT.
//!
//! # Lomb-Scargle
//!
//! The generalised (floating-mean) periodogram fits
//! ```text
//! y(t) ≈ c + a cos(ω(t − τ)) + b sin(ω(t − τ))
//! ```
//! at each angular frequency ω, with the offset τ chosen so the cosine and
//! sine terms are orthogonal. With unit weights and PSD normalisation the
//! power is
//! ```text
//! P(ω) = N/2 · (YC²/CC + YS²/SS)
//! ```
//! where the sums are taken over the mean-removed data.

use std::f64::consts::PI;

use thiserror::Error;

/// Error type for spectral computations.
#[derive(Debug, Error)]
pub enum SpectrumError {
    /// Series and times differ in length
    #[error("Length mismatch: {times} times, {values} values")]
    LengthMismatch { times: usize, values: usize },

    /// Not enough samples
    #[error("Too few samples: need {needed}, found {found}")]
    TooFewSamples { needed: usize, found: usize },

    /// All samples at the same time
    #[error("Sampling times span zero duration")]
    ZeroDuration,

    /// Sampling interval must be positive
    #[error("Invalid time step: {0} s")]
    InvalidTimeStep(f64),

    /// Frequency grid has no points
    #[error("Empty frequency grid: fmin {fmin:.3e} Hz >= fmax {fmax:.3e} Hz")]
    EmptyGrid { fmin: f64, fmax: f64 },
}

/// Frequency grid for a series sampled at `times` (seconds).
///
/// The grid runs from the lowest resolvable frequency `1/T` (T the total
/// duration) towards the Nyquist frequency of the nominal sampling interval,
/// `1/(2·time_step)`, oversampled by `n0`:
/// ```text
/// df = 1/(n0·T),  N = ceil((fmax − fmin)/df),  f_k = fmin + k·df
/// ```
pub fn frequency_grid(times: &[f64], time_step: f64, n0: usize) -> Result<Vec<f64>, SpectrumError> {
    if times.len() < 2 {
        return Err(SpectrumError::TooFewSamples {
            needed: 2,
            found: times.len(),
        });
    }
    if !(time_step > 0.0) {
        return Err(SpectrumError::InvalidTimeStep(time_step));
    }

    let (t_min, t_max) = times
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| (lo.min(t), hi.max(t)));
    let duration = t_max - t_min;
    if duration <= 0.0 {
        return Err(SpectrumError::ZeroDuration);
    }

    let fmin = 1.0 / duration;
    let fmax = 1.0 / (2.0 * time_step);
    let df = 1.0 / (n0.max(1) as f64 * duration);
    let n = ((fmax - fmin) / df).ceil();
    if !(n >= 1.0) {
        return Err(SpectrumError::EmptyGrid { fmin, fmax });
    }

    Ok((0..n as usize).map(|k| fmin + k as f64 * df).collect())
}

/// Lomb-Scargle power spectral density of `y` sampled at `times` (seconds),
/// evaluated at `freqs` (Hz).
///
/// Fits a floating mean and centres the data first; unit weights.
pub fn lomb_scargle_psd(
    times: &[f64],
    y: &[f64],
    freqs: &[f64],
) -> Result<Vec<f64>, SpectrumError> {
    if times.len() != y.len() {
        return Err(SpectrumError::LengthMismatch {
            times: times.len(),
            values: y.len(),
        });
    }
    if times.len() < 3 {
        return Err(SpectrumError::TooFewSamples {
            needed: 3,
            found: times.len(),
        });
    }

    let n = times.len() as f64;
    let w = 1.0 / n;

    // Shift times for precision; the periodogram is invariant to it
    let t0 = times.iter().copied().fold(f64::INFINITY, f64::min);
    let t: Vec<f64> = times.iter().map(|&ti| ti - t0).collect();

    let mean = y.iter().sum::<f64>() * w;
    let yc: Vec<f64> = y.iter().map(|&v| v - mean).collect();
    let y_sum = yc.iter().sum::<f64>() * w;

    let power = freqs
        .iter()
        .map(|&f| {
            let omega = 2.0 * PI * f;

            let (mut s, mut c, mut s2, mut c2) = (0.0, 0.0, 0.0, 0.0);
            for &ti in &t {
                let (sin_wt, cos_wt) = (omega * ti).sin_cos();
                s += w * sin_wt;
                c += w * cos_wt;
                s2 += 2.0 * w * sin_wt * cos_wt;
                c2 += 2.0 * w * (0.5 - sin_wt * sin_wt);
            }
            s2 -= 2.0 * s * c;
            c2 -= c * c - s * s;

            let omega_tau = 0.5 * s2.atan2(c2);

            let (mut yc_sum, mut ys_sum) = (0.0, 0.0);
            let (mut cc, mut ss, mut ct, mut st) = (0.0, 0.0, 0.0, 0.0);
            for (&ti, &yi) in t.iter().zip(&yc) {
                let (sin_a, cos_a) = (omega * ti - omega_tau).sin_cos();
                yc_sum += w * yi * cos_a;
                ys_sum += w * yi * sin_a;
                cc += w * cos_a * cos_a;
                ss += w * sin_a * sin_a;
                ct += w * cos_a;
                st += w * sin_a;
            }
            yc_sum -= y_sum * ct;
            ys_sum -= y_sum * st;
            cc -= ct * ct;
            ss -= st * st;

            let mut p = 0.0;
            if cc > 0.0 {
                p += yc_sum * yc_sum / cc;
            }
            if ss > 0.0 {
                p += ys_sum * ys_sum / ss;
            }
            0.5 * n * p
        })
        .collect();

    Ok(power)
}

/// Simpson sums over the interval pairs `(i, i+1, i+2)` for `i` in `start..stop` step 2.
fn basic_simpson(y: &[f64], x: &[f64], start: usize, stop: usize) -> f64 {
    (start..stop)
        .step_by(2)
        .map(|i| {
            let h0 = x[i + 1] - x[i];
            let h1 = x[i + 2] - x[i + 1];
            let hsum = h0 + h1;
            let hprod = h0 * h1;
            let h0divh1 = h0 / h1;
            hsum / 6.0
                * (y[i] * (2.0 - 1.0 / h0divh1)
                    + y[i + 1] * (hsum * hsum / hprod)
                    + y[i + 2] * (2.0 - h0divh1))
        })
        .sum()
}

/// Composite Simpson integral of `y` over irregularly spaced `x`.
///
/// For an even number of samples (odd number of intervals) the result is the
/// average of Simpson on the first N−1 samples plus a trapezoid on the last
/// interval and a trapezoid on the first interval plus Simpson on the rest.
/// Fewer than two samples integrate to zero.
pub fn simpson(y: &[f64], x: &[f64]) -> f64 {
    let n = y.len().min(x.len());
    match n {
        0 | 1 => 0.0,
        2 => 0.5 * (x[1] - x[0]) * (y[0] + y[1]),
        _ if n % 2 == 1 => basic_simpson(y, x, 0, n - 2),
        _ => {
            let last = 0.5 * (x[n - 1] - x[n - 2]) * (y[n - 1] + y[n - 2]);
            let first = 0.5 * (x[1] - x[0]) * (y[1] + y[0]);
            let head = basic_simpson(y, x, 0, n - 3) + last;
            let tail = first + basic_simpson(y, x, 1, n - 2);
            0.5 * (head + tail)
        }
    }
}

/// Indices of the local maxima of `y`.
///
/// A flat-topped peak is reported at the middle of the plateau (the left of
/// the two middle samples for an even-length plateau). The first and last
/// samples are never peaks.
pub fn find_peaks(y: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if y.len() < 3 {
        return peaks;
    }

    let i_max = y.len() - 1;
    let mut i = 1;
    while i < i_max {
        if y[i - 1] < y[i] {
            let mut ahead = i + 1;
            while ahead < i_max && y[ahead] == y[i] {
                ahead += 1;
            }
            if y[ahead] < y[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}
