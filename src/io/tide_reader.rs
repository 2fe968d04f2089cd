//! Tide level file reader and writer.
//!
//! Tide files hold water levels at known times, either pre-computed tide
//! levels at the satellite acquisition times or a tide gauge record used to
//! calibrate a harmonic model.
//!
//! # File Formats
//!
//! ## Simple Text Format
//!
//! ```text
//! # Tide levels
//! # station: Sydney Fort Denison
//! # longitude: 151.226
//! # latitude: -33.855
//! # datum: MSL
//! # units: m
//! # columns: datetime water_level(m)
//! 1999-05-27T23:31:02Z 0.412
//! 1999-06-04 23:31:20 -0.153
//! ```
//!
//! ## CSV Format
//!
//! ```text
//! dates,tide
//! 1999-05-27T23:31:02Z,0.412
//! 1999-06-04T23:31:20Z,-0.153
//! ```
//!
//! Times are RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or Unix seconds.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::tide::TideSeries;

/// Error type for tide file operations.
#[derive(Debug, Error)]
pub enum TideFileError {
    /// IO error reading file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Parse error in file content
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Parsed tide level file.
#[derive(Clone, Debug, Default)]
pub struct TideFile {
    /// Station or source name, if given
    pub station: Option<String>,
    /// (lon, lat) of the station, if given
    pub location: Option<(f64, f64)>,
    /// Reference datum (if specified)
    pub datum: Option<String>,
    /// Units (if specified)
    pub units: Option<String>,
    /// Tide levels
    pub series: TideSeries,
}

impl TideFile {
    /// Create from a series without metadata.
    pub fn from_series(series: TideSeries) -> Self {
        Self {
            series,
            ..Default::default()
        }
    }

    /// Set station name.
    pub fn with_station(mut self, name: impl Into<String>) -> Self {
        self.station = Some(name.into());
        self
    }

    /// Set station location.
    pub fn with_location(mut self, lon: f64, lat: f64) -> Self {
        self.location = Some((lon, lat));
        self
    }
}

/// Parse a time value.
///
/// Supports:
/// - RFC 3339: "2024-01-01T00:00:00Z", "2024-01-01T10:00:00+10:00"
/// - Naive UTC: "2024-01-01 00:00:00" or "2024-01-01T00:00:00"
/// - Unix seconds: "1704067200"
pub fn parse_time_value(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(seconds) = s.parse::<f64>() {
        if !seconds.is_finite() {
            return Err(format!("Timestamp is not finite: {s}"));
        }
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round() as u32;
        return DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
            .ok_or_else(|| format!("Timestamp out of range: {s}"));
    }

    Err(format!("Unable to parse time value: {s}"))
}

/// Split a data line into the time and level fields.
///
/// Whitespace-separated lines may use a space between date and time, so
/// the level is the last field and everything before it is the time.
fn split_fields(line: &str, is_csv: bool) -> Option<(String, &str)> {
    if is_csv {
        let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
        return (parts.len() >= 2).then(|| (parts[0].to_string(), parts[1]));
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.len() {
        0 | 1 => None,
        2 => Some((parts[0].to_string(), parts[1])),
        n => Some((parts[..n - 1].join(" "), parts[n - 1])),
    }
}

/// Read a tide level file.
pub fn read_tide_file(path: &Path) -> Result<TideFile, TideFileError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut metadata: HashMap<String, String> = HashMap::new();
    let mut series = TideSeries::default();
    let mut is_csv = false;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(content) = line.strip_prefix('#') {
            if let Some((key, value)) = content.trim().split_once(':') {
                metadata.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
            continue;
        }

        // CSV header row
        if series.is_empty()
            && line.contains(',')
            && line
                .split(',')
                .all(|field| {
                    parse_time_value(field).is_err() && field.trim().parse::<f64>().is_err()
                })
        {
            is_csv = true;
            continue;
        }
        is_csv = is_csv || line.contains(',');

        let parse_error = |message: String| TideFileError::ParseError {
            line: line_num + 1,
            message,
        };

        let (time_str, level_str) = split_fields(line, is_csv)
            .ok_or_else(|| parse_error("expected: time level".into()))?;

        let date = parse_time_value(&time_str).map_err(parse_error)?;
        let level: f64 = level_str
            .parse()
            .map_err(|e| parse_error(format!("water level parse error: {e}")))?;

        series.push(date, level);
    }

    if series.is_empty() {
        return Err(TideFileError::InvalidFormat(
            "No data points found".to_string(),
        ));
    }

    let lon = metadata
        .get("longitude")
        .or_else(|| metadata.get("lon"))
        .and_then(|s| s.parse::<f64>().ok());
    let lat = metadata
        .get("latitude")
        .or_else(|| metadata.get("lat"))
        .and_then(|s| s.parse::<f64>().ok());

    Ok(TideFile {
        station: metadata.get("station").cloned(),
        location: lon.zip(lat),
        datum: metadata.get("datum").cloned(),
        units: metadata.get("units").cloned(),
        series,
    })
}

/// Write tide levels in the simple text format with metadata headers.
pub fn write_tide_file(path: &Path, data: &TideFile) -> Result<(), TideFileError> {
    let mut file = std::io::BufWriter::new(File::create(path)?);

    writeln!(file, "# Tide levels")?;
    if let Some(ref station) = data.station {
        writeln!(file, "# station: {station}")?;
    }
    if let Some((lon, lat)) = data.location {
        writeln!(file, "# longitude: {lon:.6}")?;
        writeln!(file, "# latitude: {lat:.6}")?;
    }
    if let Some(ref datum) = data.datum {
        writeln!(file, "# datum: {datum}")?;
    }
    if let Some(ref units) = data.units {
        writeln!(file, "# units: {units}")?;
    }
    writeln!(file, "# columns: datetime water_level(m)")?;

    for (date, level) in data.series.dates.iter().zip(&data.series.levels) {
        writeln!(
            file,
            "{} {:.6}",
            date.to_rfc3339_opts(SecondsFormat::Secs, true),
            level
        )?;
    }

    file.flush()?;
    Ok(())
}
