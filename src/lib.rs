//! # slope-rs
//!
//! Beach slope estimation from satellite-derived shorelines and tide levels.
//!
//! A satellite maps the shoreline at whatever the tide was when the image was
//! taken, so the cross-shore position of the shoreline moves with the tide by
//! `η/β` on a beach of slope β. Correcting the series for the right slope
//! removes the tidal signal; the slope is found as the candidate that leaves
//! the least spectral energy at the aliased tidal frequency.
//!
//! This crate provides:
//! - Readers for shoreline datasets, transects, tidal constituents and tide levels
//! - Dataset filters and shoreline/transect intersection with quality control
//! - Harmonic tide model with least-squares calibration from a tide gauge
//! - Lomb-Scargle spectra of unevenly sampled series
//! - Slope estimation and figures of every stage
//! - A configurable pipeline and the `estimate-slope` command-line tool

pub mod analysis;
pub mod config;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod plot;
pub mod tide;

pub use analysis::{
    CrossDistances, DateRange, IntersectionSettings, OutlierMode, SlopeError, SlopeEstimate,
    SlopeSettings, TidalBand, compute_intersection, estimate_slope, find_tide_peak,
    reject_outliers,
};
pub use config::{ConfigError, SlopeConfig, TideSource};
pub use io::{ShorelineDataset, ShorelineRecord, Transect};
pub use pipeline::{PipelineError, SlopeReport};
pub use tide::{HarmonicTideModel, PrecomputedTide, TideError, TideModel, TideSeries};
