//! Writers for slope estimates and cross-shore distance series.
//!
//! # File Formats
//!
//! ## Slope Table
//!
//! ```text
//! # Beach slopes
//! # site: NARRA
//! # slopes: 0.035 to 0.200 step 0.005
//! # tidal_band: 1.2103e-6 1.2303e-6
//! # columns: transect slope n_points
//! NA1 0.085 312
//! NA2 0.070 305
//! ```
//!
//! ## Cross-Shore Distances (CSV)
//!
//! ```text
//! dates,NA1,NA2
//! 1999-05-27T23:31:02Z,115.32,
//! 1999-06-04T23:31:20Z,112.80,98.41
//! ```
//!
//! Missing values are written as empty cells.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::analysis::{CrossDistances, SlopeEstimate, SlopeSettings};

/// Error type for output files.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error writing file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Series length does not match the dates
    #[error("Transect {transect}: {found} values for {expected} dates")]
    Misaligned {
        transect: String,
        found: usize,
        expected: usize,
    },
}

/// Write one line per transect with its slope estimate.
pub fn write_slope_file(
    path: &Path,
    site: &str,
    settings: &SlopeSettings,
    estimates: &[SlopeEstimate],
) -> Result<(), OutputError> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "# Beach slopes")?;
    writeln!(file, "# site: {site}")?;
    writeln!(
        file,
        "# slopes: {:.3} to {:.3} step {:.3}",
        settings.slope_min, settings.slope_max, settings.delta_slope
    )?;
    if let Some(band) = settings.freqs_max {
        writeln!(file, "# tidal_band: {:.4e} {:.4e}", band.low, band.high)?;
    }
    writeln!(file, "# columns: transect slope n_points")?;

    for est in estimates {
        writeln!(file, "{} {:.3} {}", est.transect, est.slope, est.n_points)?;
    }

    file.flush()?;
    Ok(())
}

/// Write the cross-shore distance series as CSV, one column per transect.
pub fn write_cross_distance_file(
    path: &Path,
    dates: &[DateTime<Utc>],
    cross: &CrossDistances,
) -> Result<(), OutputError> {
    for series in cross.iter() {
        if series.values.len() != dates.len() {
            return Err(OutputError::Misaligned {
                transect: series.name.clone(),
                found: series.values.len(),
                expected: dates.len(),
            });
        }
    }

    let mut file = BufWriter::new(File::create(path)?);

    let header: Vec<&str> = std::iter::once("dates")
        .chain(cross.iter().map(|s| s.name.as_str()))
        .collect();
    writeln!(file, "{}", header.join(","))?;

    for (i, date) in dates.iter().enumerate() {
        let mut row = vec![date.to_rfc3339_opts(SecondsFormat::Secs, true)];
        row.extend(cross.iter().map(|s| {
            let v = s.values[i];
            if v.is_nan() {
                String::new()
            } else {
                format!("{v:.2}")
            }
        }));
        writeln!(file, "{}", row.join(","))?;
    }

    file.flush()?;
    Ok(())
}
