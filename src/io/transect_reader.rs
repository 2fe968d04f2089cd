//! Reader for cross-shore transect geometries.
//!
//! Transects are stored as a GeoJSON `FeatureCollection` of `LineString`
//! features in the same projected coordinate system as the shorelines. Each
//! feature carries a `name` property. The first position of the line is the
//! landward origin and the last position is the seaward end.
//!
//! ```text
//! {"type": "FeatureCollection", "features": [
//!   {"type": "Feature",
//!    "properties": {"name": "NA1"},
//!    "geometry": {"type": "LineString",
//!                 "coordinates": [[342422.1, 6269340.2], [342691.4, 6269249.8]]}}
//! ]}
//! ```

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use geo::{Coord, Line};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Error type for transect file operations.
#[derive(Debug, Error)]
pub enum TransectFileError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed JSON content
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Feature that cannot be used as a transect
    #[error("Invalid feature {index}: {message}")]
    InvalidFeature { index: usize, message: String },

    /// Two features share the same name
    #[error("Duplicate transect name: {0}")]
    DuplicateName(String),

    /// The collection has no transects
    #[error("No transects found")]
    Empty,
}

/// A cross-shore reference line.
#[derive(Clone, Debug, PartialEq)]
pub struct Transect {
    /// Transect identifier
    pub name: String,
    /// Landward origin (chainage zero)
    pub origin: Coord<f64>,
    /// Seaward end point
    pub end: Coord<f64>,
}

impl Transect {
    /// Create a transect from its origin and seaward end.
    pub fn new(name: impl Into<String>, origin: Coord<f64>, end: Coord<f64>) -> Self {
        Self {
            name: name.into(),
            origin,
            end,
        }
    }

    /// The transect as a line segment.
    pub fn line(&self) -> Line<f64> {
        Line::new(self.origin, self.end)
    }

    /// Transect length in metres.
    pub fn length(&self) -> f64 {
        let d = self.line().delta();
        d.x.hypot(d.y)
    }

    /// Orientation of the transect, counter-clockwise from the x axis (radians).
    pub fn angle(&self) -> f64 {
        let d = self.line().delta();
        d.y.atan2(d.x)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

fn invalid(index: usize, message: impl Into<String>) -> TransectFileError {
    TransectFileError::InvalidFeature {
        index,
        message: message.into(),
    }
}

fn position(index: usize, value: &Value) -> Result<Coord<f64>, TransectFileError> {
    let pos = value
        .as_array()
        .filter(|p| p.len() >= 2)
        .ok_or_else(|| invalid(index, "position must have at least two numbers"))?;
    let x = pos[0]
        .as_f64()
        .ok_or_else(|| invalid(index, "non-numeric x coordinate"))?;
    let y = pos[1]
        .as_f64()
        .ok_or_else(|| invalid(index, "non-numeric y coordinate"))?;
    Ok(Coord { x, y })
}

fn feature_name(index: usize, feature: &Feature) -> Result<String, TransectFileError> {
    let name = feature
        .properties
        .as_ref()
        .and_then(|p| p.get("name"))
        .ok_or_else(|| invalid(index, "missing 'name' property"))?;

    match name {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(index, "'name' must be a string or number")),
    }
}

/// Read transects from a GeoJSON file, in file order.
pub fn read_transect_file(path: &Path) -> Result<Vec<Transect>, TransectFileError> {
    let content = std::fs::read_to_string(path)?;
    parse_transects(&content)
}

/// Parse transects from a GeoJSON string, in feature order.
pub fn parse_transects(content: &str) -> Result<Vec<Transect>, TransectFileError> {
    let collection: FeatureCollection = serde_json::from_str(content)?;
    let mut seen = HashSet::new();
    let mut transects = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.iter().enumerate() {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| invalid(index, "missing geometry"))?;
        if geometry.kind != "LineString" {
            return Err(invalid(
                index,
                format!("expected LineString geometry, got {}", geometry.kind),
            ));
        }

        let coords = geometry
            .coordinates
            .as_array()
            .filter(|c| c.len() >= 2)
            .ok_or_else(|| invalid(index, "LineString needs at least two positions"))?;

        let origin = position(index, &coords[0])?;
        let end = position(index, &coords[coords.len() - 1])?;
        if origin == end {
            return Err(invalid(index, "origin and end coincide"));
        }

        let name = feature_name(index, feature)?;
        if !seen.insert(name.clone()) {
            return Err(TransectFileError::DuplicateName(name));
        }

        transects.push(Transect::new(name, origin, end));
    }

    if transects.is_empty() {
        return Err(TransectFileError::Empty);
    }

    Ok(transects)
}

/// Write transects as a GeoJSON `FeatureCollection`.
pub fn write_transect_file(path: &Path, transects: &[Transect]) -> Result<(), TransectFileError> {
    let features: Vec<Value> = transects
        .iter()
        .map(|t| {
            serde_json::json!({
                "type": "Feature",
                "properties": { "name": t.name },
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[t.origin.x, t.origin.y], [t.end.x, t.end.y]],
                },
            })
        })
        .collect();

    let collection = serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    });

    let mut file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(&mut file, &collection)?;
    writeln!(file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_parse_keeps_file_order() {
        let content = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "NA2"},
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [5, 5], [10, 0]]}},
            {"type": "Feature", "properties": {"name": 1},
             "geometry": {"type": "LineString", "coordinates": [[0, 0, 2.0], [0, 10, 2.0]]}}
        ]}"#;
        let transects = parse_transects(content).unwrap();

        assert_eq!(transects.len(), 2);
        assert_eq!(transects[0].name, "NA2");
        assert_eq!(transects[0].end, Coord { x: 10.0, y: 0.0 });
        assert_eq!(transects[1].name, "1");
        assert!((transects[1].length() - 10.0).abs() < TOL);
        assert!((transects[1].angle() - std::f64::consts::FRAC_PI_2).abs() < TOL);
    }

    #[test]
    fn test_rejects_points() {
        let content = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "A"},
             "geometry": {"type": "Point", "coordinates": [0, 0]}}
        ]}"#;
        assert!(matches!(
            parse_transects(content),
            Err(TransectFileError::InvalidFeature { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_missing_name_and_duplicates() {
        let unnamed = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}}
        ]}"#;
        assert!(parse_transects(unnamed).is_err());

        let duplicate = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"name": "A"},
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
            {"type": "Feature", "properties": {"name": "A"},
             "geometry": {"type": "LineString", "coordinates": [[0, 0], [2, 1]]}}
        ]}"#;
        assert!(matches!(
            parse_transects(duplicate),
            Err(TransectFileError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_empty_collection() {
        let content = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(
            parse_transects(content),
            Err(TransectFileError::Empty)
        ));
    }

    #[test]
    fn test_write_and_read() {
        let transects = vec![
            Transect::new("T1", Coord { x: 0.0, y: 0.0 }, Coord { x: 100.0, y: 0.0 }),
            Transect::new("T2", Coord { x: 0.0, y: 50.0 }, Coord { x: 100.0, y: 50.0 }),
        ];
        let file = NamedTempFile::new().unwrap();

        write_transect_file(file.path(), &transects).unwrap();
        let read_back = read_transect_file(file.path()).unwrap();

        assert_eq!(read_back, transects);
    }
}
