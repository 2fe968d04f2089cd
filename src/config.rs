//! Run configuration.
//!
//! A run is described by a TOML file with one table per stage. Every field
//! has a default, so a file only needs to list what differs from the
//! Narrabeen example run:
//!
//! ```toml
//! [site]
//! name = "NARRA"
//! data_dir = "example_data"
//!
//! [filter]
//! exclude_satellite = "S2"
//! georef_threshold = 10.0
//!
//! [intersection]
//! along_dist = 25.0
//! nan_max = "auto"
//!
//! [slope]
//! slope_min = 0.035
//! slope_max = 0.2
//! delta_slope = 0.005
//! date_range = { start = "1999-05-01T00:00:00Z", end = "2020-01-01T00:00:00Z" }
//!
//! [tide]
//! location = [151.332209, -33.723772]
//! time_step_minutes = 15.0
//! source = { kind = "harmonic", constituents = "NARRA_constituents.txt" }
//! ```
//!
//! Relative paths are resolved against `site.data_dir`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{IntersectionSettings, SlopeSettings};
use crate::io::constituent_period;

/// Error type for configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading or writing the file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML could not be parsed
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration could not be serialised
    #[error("Serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Site and input locations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site name, the prefix of the input files
    pub name: String,
    /// Directory holding the input files
    pub data_dir: PathBuf,
    /// Transect file; `<name>_transects.geojson` when not set
    pub transects: Option<PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "NARRA".to_string(),
            data_dir: PathBuf::from("example_data"),
            transects: None,
        }
    }
}

/// Dataset filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Satellite mission to drop (exact name)
    pub exclude_satellite: Option<String>,
    /// Drop records from the same day
    pub remove_duplicates: bool,
    /// Largest accepted georeferencing RMSE (m)
    pub georef_threshold: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_satellite: Some("S2".to_string()),
            remove_duplicates: true,
            georef_threshold: 10.0,
        }
    }
}

/// Where tide levels come from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TideSource {
    /// Harmonic model from a constituent file
    Harmonic { constituents: PathBuf },
    /// Pre-computed tide levels, interpolated in time
    File { path: PathBuf },
    /// Harmonic model fitted to a tide gauge record
    Gauge {
        path: PathBuf,
        constituents: Vec<String>,
    },
}

impl Default for TideSource {
    fn default() -> Self {
        TideSource::Harmonic {
            constituents: PathBuf::from("NARRA_constituents.txt"),
        }
    }
}

/// Tide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TideConfig {
    /// (lon, lat) of the offshore tide point
    pub location: (f64, f64),
    /// Step of the continuous tide series (minutes)
    pub time_step_minutes: f64,
    /// Largest offset (degrees) between `location` and a harmonic model's location
    pub max_offset_deg: f64,
    /// Tide source
    pub source: TideSource,
}

impl Default for TideConfig {
    fn default() -> Self {
        Self {
            location: (151.332209, -33.723772),
            time_step_minutes: 15.0,
            max_offset_deg: 0.5,
            source: TideSource::default(),
        }
    }
}

impl TideConfig {
    /// Step of the continuous tide series.
    pub fn time_step(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.time_step_minutes * 60_000.0).round() as i64)
    }
}

/// Output settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write PNG plots
    pub plots: bool,
    /// Directory for plots
    pub plot_dir: PathBuf,
    /// Slope table, if wanted
    pub slope_file: Option<PathBuf>,
    /// Cross-shore distance CSV, if wanted
    pub cross_distance_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plots: true,
            plot_dir: PathBuf::from("plots"),
            slope_file: None,
            cross_distance_file: None,
        }
    }
}

/// Complete run configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeConfig {
    pub site: SiteConfig,
    pub filter: FilterConfig,
    pub intersection: IntersectionSettings,
    pub slope: SlopeSettings,
    pub tide: TideConfig,
    pub output: OutputConfig,
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn require_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be positive, got {value}")))
    }
}

impl SlopeConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// TOML representation.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values are within acceptable ranges.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.name.trim().is_empty() {
            return Err(invalid("site name must not be empty"));
        }

        require_positive("filter.georef_threshold", self.filter.georef_threshold)?;

        let t = &self.intersection;
        require_positive("intersection.along_dist", t.along_dist)?;
        require_positive("intersection.max_std", t.max_std)?;
        require_positive("intersection.max_range", t.max_range)?;
        require_positive("intersection.max_origin_distance", t.max_origin_distance)?;
        require_positive("intersection.max_cross_change", t.max_cross_change)?;
        if !(0.0..=1.0).contains(&t.prc_std) {
            return Err(invalid(format!(
                "intersection.prc_std must be in [0, 1], got {}",
                t.prc_std
            )));
        }

        let s = &self.slope;
        require_positive("slope.slope_min", s.slope_min)?;
        require_positive("slope.delta_slope", s.delta_slope)?;
        require_positive("slope.n_days", s.n_days)?;
        require_positive("slope.delta_f", s.delta_f)?;
        if s.slope_max < s.slope_min {
            return Err(invalid(format!(
                "slope.slope_max ({}) is below slope.slope_min ({})",
                s.slope_max, s.slope_min
            )));
        }
        if s.date_range.start >= s.date_range.end {
            return Err(invalid("slope.date_range must have start before end"));
        }
        if s.n0 == 0 {
            return Err(invalid("slope.n0 must be at least 1"));
        }
        if s.freqs_cutoff < 0.0 {
            return Err(invalid("slope.freqs_cutoff must not be negative"));
        }
        if let Some(band) = s.freqs_max {
            if band.low >= band.high {
                return Err(invalid("slope.freqs_max must have low below high"));
            }
        }

        let tide = &self.tide;
        require_positive("tide.time_step_minutes", tide.time_step_minutes)?;
        require_positive("tide.max_offset_deg", tide.max_offset_deg)?;
        let (lon, lat) = tide.location;
        if !(-90.0..=90.0).contains(&lat) || !(-360.0..=360.0).contains(&lon) {
            return Err(invalid(format!("tide.location ({lon}, {lat}) is not a valid lon/lat")));
        }
        if let TideSource::Gauge { constituents, .. } = &tide.source {
            if constituents.is_empty() {
                return Err(invalid("tide.source.constituents must list at least one constituent"));
            }
            if let Some(unknown) = constituents.iter().find(|c| constituent_period(c).is_none()) {
                return Err(invalid(format!("unknown tidal constituent {unknown}")));
            }
        }

        Ok(())
    }

    /// Resolve a path against the data directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.site.data_dir.join(path)
        }
    }

    /// Path of the shoreline dataset.
    pub fn shoreline_file(&self) -> PathBuf {
        crate::io::shoreline_path(&self.site.data_dir, &self.site.name)
    }

    /// Path of the transect file.
    pub fn transect_file(&self) -> PathBuf {
        match &self.site.transects {
            Some(path) => self.resolve(path),
            None => self
                .site
                .data_dir
                .join(format!("{}_transects.geojson", self.site.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::OutlierMode;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SlopeConfig::default();
        assert_eq!(config.site.name, "NARRA");
        assert_eq!(config.filter.exclude_satellite.as_deref(), Some("S2"));
        assert_eq!(config.intersection.outlier_mode, OutlierMode::Auto);
        assert_eq!(config.slope.n0, 50);
        assert_eq!(config.tide.time_step().num_seconds(), 900);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let content = r#"
            [site]
            name = "DUCK"

            [intersection]
            nan_max = "max"

            [slope]
            slope_max = 0.15
            date_range = { start = "2000-01-01T00:00:00Z", end = "2010-01-01T00:00:00Z" }

            [tide]
            source = { kind = "file", path = "DUCK_tide.txt" }
        "#;
        let config: SlopeConfig = toml::from_str(content).unwrap();

        assert_eq!(config.site.name, "DUCK");
        assert_eq!(config.site.data_dir, PathBuf::from("example_data"));
        assert_eq!(config.intersection.outlier_mode, OutlierMode::Max);
        assert_eq!(config.intersection.along_dist, 25.0);
        assert_eq!(config.slope.slope_max, 0.15);
        assert_eq!(config.slope.slope_min, 0.035);
        assert!(matches!(config.tide.source, TideSource::File { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SlopeConfig::default();
        config.slope.delta_slope = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SlopeConfig::default();
        config.intersection.prc_std = 1.5;
        assert!(config.validate().is_err());

        let mut config = SlopeConfig::default();
        config.slope.date_range.end = config.slope.date_range.start;
        assert!(config.validate().is_err());

        let mut config = SlopeConfig::default();
        config.tide.source = TideSource::Gauge {
            path: "gauge.txt".into(),
            constituents: vec!["M2".into(), "XX9".into()],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_paths() {
        let config = SlopeConfig::default();
        assert_eq!(
            config.transect_file(),
            PathBuf::from("example_data/NARRA_transects.geojson")
        );
        assert_eq!(
            config.shoreline_file(),
            PathBuf::from("example_data/NARRA_output.json")
        );
        assert_eq!(
            config.resolve(Path::new("tide.txt")),
            PathBuf::from("example_data/tide.txt")
        );
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.toml");

        let mut original = SlopeConfig::default();
        original.site.name = "TEST".into();
        original.slope.n_days = 16.0;
        original.save(&path).unwrap();

        let loaded = SlopeConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
