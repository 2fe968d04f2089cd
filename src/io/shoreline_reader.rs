//! Reader for satellite-derived shoreline datasets.
//!
//! A shoreline dataset holds one record per satellite image: acquisition
//! time, satellite mission, the mapped shoreline as projected (x, y) points
//! and the georeferencing accuracy of the image.
//!
//! # File Format
//!
//! Files are named `<site>_output.json` and store the fields as parallel
//! arrays, one entry per image:
//!
//! ```text
//! {
//!   "dates":       ["1999-05-27T23:31:02Z", "1999-06-04T23:31:20Z"],
//!   "satname":     ["L5", "L7"],
//!   "shorelines":  [[[342680.1, 6266040.7], [342685.3, 6266052.9]], [...]],
//!   "geoaccuracy": [5.21, "PASSED"],
//!   "cloud_cover": [0.0, 0.12]
//! }
//! ```
//!
//! `geoaccuracy` is the RMSE in metres, `-1` when georeferencing failed. The
//! strings `"PASSED"` and `"FAILED"` are accepted for missions that only
//! report a pass/fail flag. `cloud_cover` is optional.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Georeferencing accuracy value marking a failed georeference.
pub const GEOREF_FAILED: f64 = -1.0;

/// Error type for shoreline file operations.
#[derive(Debug, Error)]
pub enum ShorelineFileError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed JSON content
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A per-image field does not have one entry per image
    #[error("Field '{field}' has {found} entries, expected {expected}")]
    Misaligned {
        field: &'static str,
        found: usize,
        expected: usize,
    },
}

/// One satellite image worth of shoreline data.
#[derive(Clone, Debug, PartialEq)]
pub struct ShorelineRecord {
    /// Acquisition time
    pub date: DateTime<Utc>,
    /// Satellite mission identifier ("L5", "L7", "L8", "S2", ...)
    pub satname: String,
    /// Shoreline points in projected coordinates (metres)
    pub shoreline: Vec<Coord<f64>>,
    /// Georeferencing RMSE in metres, [`GEOREF_FAILED`] if it failed
    pub geoaccuracy: f64,
    /// Cloud cover fraction, when reported
    pub cloud_cover: Option<f64>,
}

/// Time-ordered collection of shoreline records.
#[derive(Clone, Debug, Default)]
pub struct ShorelineDataset {
    /// Records sorted by acquisition time
    pub records: Vec<ShorelineRecord>,
}

impl ShorelineDataset {
    /// Create a dataset, sorting the records by acquisition time.
    pub fn new(mut records: Vec<ShorelineRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Acquisition times in record order.
    pub fn dates(&self) -> Vec<DateTime<Utc>> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// Whether any record comes from the given mission.
    pub fn has_satellite(&self, satname: &str) -> bool {
        self.records.iter().any(|r| r.satname == satname)
    }

    /// Keep only records matching the predicate, returning how many were removed.
    pub fn retain<F>(&mut self, predicate: F) -> usize
    where
        F: FnMut(&ShorelineRecord) -> bool,
    {
        let before = self.records.len();
        self.records.retain(predicate);
        before - self.records.len()
    }
}

/// Accuracy entry as stored on disk.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum GeoAccuracy {
    Rmse(f64),
    Flag(String),
}

impl GeoAccuracy {
    fn to_rmse(&self) -> f64 {
        match self {
            GeoAccuracy::Rmse(v) => *v,
            GeoAccuracy::Flag(flag) if flag.eq_ignore_ascii_case("PASSED") => 0.0,
            GeoAccuracy::Flag(_) => GEOREF_FAILED,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct ShorelineFile {
    dates: Vec<DateTime<Utc>>,
    satname: Vec<String>,
    shorelines: Vec<Vec<[f64; 2]>>,
    geoaccuracy: Vec<GeoAccuracy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cloud_cover: Option<Vec<f64>>,
}

fn check_aligned(
    field: &'static str,
    found: usize,
    expected: usize,
) -> Result<(), ShorelineFileError> {
    if found != expected {
        return Err(ShorelineFileError::Misaligned {
            field,
            found,
            expected,
        });
    }
    Ok(())
}

/// Path of the shoreline dataset for a site: `<data_dir>/<site>_output.json`.
pub fn shoreline_path(data_dir: &Path, site: &str) -> PathBuf {
    data_dir.join(format!("{site}_output.json"))
}

/// Read a shoreline dataset file.
pub fn read_shoreline_file(path: &Path) -> Result<ShorelineDataset, ShorelineFileError> {
    let content = std::fs::read_to_string(path)?;
    parse_shorelines(&content)
}

/// Parse a shoreline dataset from a JSON string.
pub fn parse_shorelines(content: &str) -> Result<ShorelineDataset, ShorelineFileError> {
    let file: ShorelineFile = serde_json::from_str(content)?;
    let n = file.dates.len();

    check_aligned("satname", file.satname.len(), n)?;
    check_aligned("shorelines", file.shorelines.len(), n)?;
    check_aligned("geoaccuracy", file.geoaccuracy.len(), n)?;
    if let Some(ref cloud) = file.cloud_cover {
        check_aligned("cloud_cover", cloud.len(), n)?;
    }

    let records = (0..n)
        .map(|i| ShorelineRecord {
            date: file.dates[i],
            satname: file.satname[i].clone(),
            shoreline: file.shorelines[i]
                .iter()
                .map(|&[x, y]| Coord { x, y })
                .collect(),
            geoaccuracy: file.geoaccuracy[i].to_rmse(),
            cloud_cover: file.cloud_cover.as_ref().map(|c| c[i]),
        })
        .collect();

    Ok(ShorelineDataset::new(records))
}

/// Write a shoreline dataset in the same JSON layout it is read from.
pub fn write_shoreline_file(
    path: &Path,
    dataset: &ShorelineDataset,
) -> Result<(), ShorelineFileError> {
    let records = &dataset.records;
    let has_cloud = records.iter().all(|r| r.cloud_cover.is_some()) && !records.is_empty();

    let file = ShorelineFile {
        dates: records.iter().map(|r| r.date).collect(),
        satname: records.iter().map(|r| r.satname.clone()).collect(),
        shorelines: records
            .iter()
            .map(|r| r.shoreline.iter().map(|c| [c.x, c.y]).collect())
            .collect(),
        geoaccuracy: records
            .iter()
            .map(|r| GeoAccuracy::Rmse(r.geoaccuracy))
            .collect(),
        cloud_cover: has_cloud.then(|| {
            records
                .iter()
                .map(|r| r.cloud_cover.unwrap_or_default())
                .collect()
        }),
    };

    let writer = std::io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer(writer, &file)?;
    Ok(())
}
