//! I/O utilities for reading and writing data files.
//!
//! This module provides:
//! - **Shorelines**: satellite-derived shoreline datasets (`<site>_output.json`)
//! - **Transects**: cross-shore reference lines (GeoJSON)
//! - **Tidal constituents**: harmonic data (amplitude, phase) for the tide model
//! - **Tide levels**: pre-computed tide levels or a tide gauge record
//! - **Results**: slope tables and cross-shore distance series
//!
//! # File Formats
//!
//! ## Tidal Constituent Files
//!
//! ```text
//! # Tidal constituents for Narrabeen
//! # location: 151.332209 -33.723772
//! # reference_level: 0.0
//! # epoch: 2000-01-01T00:00:00Z
//! # columns: name amplitude(m) phase(deg)
//! M2 0.50 240.3
//! S2 0.12 262.1
//! K1 0.17 110.4
//! ```
//!
//! ## Transect Files
//!
//! GeoJSON `FeatureCollection` of `LineString` features with a `name`
//! property. The first position is the landward origin, the last the seaward
//! end.
//!
//! See the submodules for the shoreline, tide and output formats.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use slope_rs::io::{read_shoreline_file, read_transect_file, shoreline_path};
//!
//! let dataset = read_shoreline_file(&shoreline_path(Path::new("example_data"), "NARRA"))?;
//! let transects = read_transect_file(Path::new("example_data/NARRA_transects.geojson"))?;
//! println!("{} images, {} transects", dataset.len(), transects.len());
//! ```

mod constituent_reader;
mod output_writer;
mod shoreline_reader;
mod tide_reader;
mod transect_reader;

pub use constituent_reader::{
    ConstituentData, ConstituentEntry, ConstituentFileError, constituent_period,
    parse_constituents, read_constituent_file,
};
pub use output_writer::{OutputError, write_cross_distance_file, write_slope_file};
pub use shoreline_reader::{
    GEOREF_FAILED, ShorelineDataset, ShorelineFileError, ShorelineRecord, parse_shorelines,
    read_shoreline_file, shoreline_path, write_shoreline_file,
};
pub use tide_reader::{TideFile, TideFileError, parse_time_value, read_tide_file, write_tide_file};
pub use transect_reader::{
    Transect, TransectFileError, parse_transects, read_transect_file, write_transect_file,
};
