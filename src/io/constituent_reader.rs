//! Harmonic constituent files.
//!
//! A constituent file describes the tide at one offshore point and is the
//! input for [`HarmonicTideModel`](crate::tide::HarmonicTideModel):
//!
//! ```text
//! # Tidal constituents offshore of Narrabeen
//! # location: 151.332209 -33.723772
//! # reference_level: 0.0
//! # epoch: 2000-01-01T00:00:00Z
//! # columns: name amplitude(m) phase(deg)
//! M2 0.507 248.2
//! S2 0.123 273.1
//! K1 0.167 21.6
//! O1 0.111 359.7
//! ```
//!
//! `#` lines are comments; `location` (lon lat, degrees), `reference_level`
//! (m) and `epoch` (RFC 3339, the instant phases refer to) are read from
//! `key: value` comments. Without an epoch, phases refer to the Unix epoch.

use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for constituent files.
#[derive(Debug, Error)]
pub enum ConstituentFileError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed line (1-based)
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Name without a known period
    #[error("Unknown constituent: {0}")]
    UnknownConstituent(String),
}

/// Periods in hours of the constituents a file may name.
const PERIODS_HOURS: &[(&str, f64)] = &[
    // semidiurnal
    ("M2", 12.4206012),
    ("S2", 12.0),
    ("N2", 12.6583482),
    ("K2", 11.9672348),
    // diurnal
    ("K1", 23.9344697),
    ("O1", 25.8193417),
    ("P1", 24.0658902),
    ("Q1", 26.8683567),
    // shallow water
    ("M4", 6.2103006),
    ("MS4", 6.1033392),
    ("MN4", 6.2691739),
    ("M6", 4.1402004),
    // long period
    ("MF", 327.8599387),
    ("MM", 661.3111655),
    ("SSA", 4382.9052083),
    ("SA", 8766.1526),
];

/// Period in seconds of a named constituent (case insensitive).
pub fn constituent_period(name: &str) -> Option<f64> {
    PERIODS_HOURS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|&(_, hours)| hours * 3600.0)
}

/// One row of a constituent file.
#[derive(Clone, Debug)]
pub struct ConstituentEntry {
    /// Upper-case name
    pub name: String,
    /// Amplitude (m)
    pub amplitude: f64,
    /// Phase (degrees) at the file epoch
    pub phase_degrees: f64,
    /// Period (s)
    pub period: f64,
}

impl ConstituentEntry {
    /// Entry for a named constituent; the period comes from the name.
    pub fn named(
        name: &str,
        amplitude: f64,
        phase_degrees: f64,
    ) -> Result<Self, ConstituentFileError> {
        let period = constituent_period(name)
            .ok_or_else(|| ConstituentFileError::UnknownConstituent(name.to_string()))?;
        Ok(Self {
            name: name.to_uppercase(),
            amplitude,
            phase_degrees,
            period,
        })
    }

    pub fn phase_radians(&self) -> f64 {
        self.phase_degrees.to_radians()
    }
}

/// Contents of a constituent file.
#[derive(Clone, Debug)]
pub struct ConstituentData {
    /// (lon, lat) of the tide point
    pub location: Option<(f64, f64)>,
    /// Mean water level (m)
    pub reference_level: f64,
    /// Instant the phases refer to
    pub epoch: DateTime<Utc>,
    pub constituents: Vec<ConstituentEntry>,
}

impl Default for ConstituentData {
    fn default() -> Self {
        Self {
            location: None,
            reference_level: 0.0,
            epoch: DateTime::<Utc>::UNIX_EPOCH,
            constituents: Vec::new(),
        }
    }
}

impl ConstituentData {
    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    /// Constituent by name (case insensitive).
    pub fn get(&self, name: &str) -> Option<&ConstituentEntry> {
        self.constituents
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Read a constituent file.
pub fn read_constituent_file(path: &Path) -> Result<ConstituentData, ConstituentFileError> {
    parse_constituents(&std::fs::read_to_string(path)?)
}

fn parse_number(field: Option<&str>, what: &str) -> Result<f64, String> {
    let field = field.ok_or_else(|| format!("missing {what}"))?;
    field
        .parse()
        .map_err(|_| format!("invalid {what} '{field}'"))
}

/// Apply a `key: value` comment; unrecognised comments are ignored.
fn apply_metadata(data: &mut ConstituentData, comment: &str) -> Result<(), String> {
    let Some((key, value)) = comment.split_once(':') else {
        return Ok(());
    };
    let value = value.trim();

    match key.trim() {
        "location" => {
            let mut fields = value.split_whitespace();
            let lon = parse_number(fields.next(), "longitude")?;
            let lat = parse_number(fields.next(), "latitude")?;
            data.location = Some((lon, lat));
        }
        "reference_level" => data.reference_level = parse_number(Some(value), "reference level")?,
        "epoch" => {
            data.epoch = DateTime::parse_from_rfc3339(value)
                .map_err(|_| format!("epoch '{value}' is not RFC 3339"))?
                .with_timezone(&Utc);
        }
        _ => {}
    }
    Ok(())
}

/// Parse constituent data from a string.
///
/// Bad metadata is an error: a wrong epoch or location shifts every level.
pub fn parse_constituents(content: &str) -> Result<ConstituentData, ConstituentFileError> {
    let mut data = ConstituentData::default();

    for (i, line) in content.lines().enumerate() {
        let at_line = |message: String| ConstituentFileError::ParseError {
            line: i + 1,
            message,
        };
        let line = line.trim();

        if let Some(comment) = line.strip_prefix('#') {
            apply_metadata(&mut data, comment).map_err(at_line)?;
            continue;
        }

        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else {
            continue;
        };
        let amplitude = parse_number(fields.next(), "amplitude").map_err(at_line)?;
        let phase = parse_number(fields.next(), "phase").map_err(at_line)?;
        data.constituents
            .push(ConstituentEntry::named(name, amplitude, phase)?);
    }

    Ok(data)
}
