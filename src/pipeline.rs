//! End-to-end slope estimation run.
//!
//! The stages run in a fixed order:
//!
//! 1. load shorelines and transects
//! 2. filter the dataset (satellite, duplicates, georeferencing)
//! 3. intersect shorelines with transects and despike
//! 4. clip to the analysis period
//! 5. tide levels at the acquisition times, tidal peak
//! 6. slope per transect
//!
//! Figures and output files are written along the way when configured.

use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::analysis::{
    CrossDistances, SlopeError, SlopeEstimate, SlopeSettings, TidalBand, TidePeak, clip_dates,
    compute_intersection, estimate_slope, find_tide_peak, reject_outliers, remove_duplicates,
    remove_inaccurate_georef, remove_satellite,
};
use crate::config::{SlopeConfig, TideSource};
use crate::io::{
    ConstituentFileError, OutputError, ShorelineDataset, ShorelineFileError, TideFileError,
    Transect, TransectFileError, read_constituent_file, read_shoreline_file, read_tide_file,
    read_transect_file, write_cross_distance_file, write_slope_file,
};
use crate::plot;
use crate::tide::{
    HarmonicTideModel, PrecomputedTide, TideError, TideModel, compute_tide, compute_tide_dates,
};

/// Error type for a slope estimation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Shoreline file: {0}")]
    Shoreline(#[from] ShorelineFileError),

    #[error("Transect file: {0}")]
    Transect(#[from] TransectFileError),

    #[error("Constituent file: {0}")]
    Constituent(#[from] ConstituentFileError),

    #[error("Tide file: {0}")]
    TideFile(#[from] TideFileError),

    #[error("Tide: {0}")]
    Tide(#[from] TideError),

    #[error("Slope estimation: {0}")]
    Slope(#[from] SlopeError),

    #[error("Output: {0}")]
    Output(#[from] OutputError),

    /// Figure could not be drawn
    #[error("Plot {name}: {message}")]
    Plot { name: String, message: String },

    /// Too little data left after filtering
    #[error("Not enough data: {0}")]
    NoData(String),
}

/// Results of a run.
#[derive(Clone, Debug)]
pub struct SlopeReport {
    /// Site name
    pub site: String,
    /// Images left after filtering
    pub n_images: usize,
    /// Acquisition times inside the analysis period
    pub dates: Vec<DateTime<Utc>>,
    /// Cross-shore distances at `dates`
    pub cross: CrossDistances,
    /// Tide level at `dates`
    pub tide: Vec<f64>,
    /// Spectrum of the sampled tide
    pub tide_peak: TidePeak,
    /// Band the slopes were estimated in
    pub band: TidalBand,
    /// One estimate per transect with enough data
    pub estimates: Vec<SlopeEstimate>,
    /// Transects skipped for lack of data
    pub skipped: Vec<String>,
}

/// Build the tide model described by the configuration.
pub fn build_tide_model(config: &SlopeConfig) -> Result<Box<dyn TideModel>, PipelineError> {
    let model: Box<dyn TideModel> = match &config.tide.source {
        TideSource::Harmonic { constituents } => {
            let data = read_constituent_file(&config.resolve(constituents))?;
            Box::new(
                HarmonicTideModel::from_constituents(&data)
                    .with_max_offset(config.tide.max_offset_deg),
            )
        }
        TideSource::File { path } => {
            let path = config.resolve(path);
            let file = read_tide_file(&path)?;
            let label = file
                .station
                .clone()
                .unwrap_or_else(|| path.display().to_string());
            Box::new(PrecomputedTide::new(file.series, label))
        }
        TideSource::Gauge { path, constituents } => {
            let file = read_tide_file(&config.resolve(path))?;
            let names: Vec<&str> = constituents.iter().map(String::as_str).collect();
            let epoch = file.series.dates.first().copied().unwrap_or_default();
            let mut model = HarmonicTideModel::calibrate(&file.series, &names, epoch)?
                .with_max_offset(config.tide.max_offset_deg);
            if let Some((lon, lat)) = file.location {
                model = model.with_location(lon, lat);
            }
            Box::new(model)
        }
    };

    tracing::info!(model = %model.describe(), "tide model");
    Ok(model)
}

fn draw(
    name: &str,
    config: &SlopeConfig,
    f: impl FnOnce(&Path) -> plot::PlotResult,
) -> Result<(), PipelineError> {
    let plot_error = |message: String| PipelineError::Plot {
        name: name.to_string(),
        message,
    };
    let path = plot::figure_path(&config.output.plot_dir, name)
        .map_err(|e| plot_error(e.to_string()))?;
    f(&path).map_err(|e| plot_error(e.to_string()))
}

/// Load the inputs named by the configuration and run the analysis.
pub fn run(config: &SlopeConfig) -> Result<SlopeReport, PipelineError> {
    let dataset = read_shoreline_file(&config.shoreline_file())?;
    let transects = read_transect_file(&config.transect_file())?;
    tracing::info!(
        site = %config.site.name,
        images = dataset.len(),
        transects = transects.len(),
        "loaded inputs"
    );

    let model = build_tide_model(config)?;
    run_with(config, dataset, &transects, model.as_ref())
}

/// Run the analysis on loaded inputs.
pub fn run_with(
    config: &SlopeConfig,
    mut dataset: ShorelineDataset,
    transects: &[Transect],
    model: &dyn TideModel,
) -> Result<SlopeReport, PipelineError> {
    let plots = config.output.plots;

    if let Some(satname) = &config.filter.exclude_satellite {
        if dataset.has_satellite(satname) {
            let removed = remove_satellite(&mut dataset, satname);
            tracing::info!(satname = %satname, removed, "removed satellite");
        }
    }
    if config.filter.remove_duplicates {
        remove_duplicates(&mut dataset);
    }
    remove_inaccurate_georef(&mut dataset, config.filter.georef_threshold);
    let n_images = dataset.len();

    if plots {
        draw("shorelines.png", config, |p| {
            plot::plot_shorelines(p, &config.site.name, &dataset, transects)
        })?;
    }

    let mut cross = compute_intersection(&dataset, transects, &config.intersection);
    reject_outliers(&mut cross, &config.intersection);

    let range = config.slope.date_range;
    let (dates, mask) = clip_dates(&dataset.dates(), &range);
    cross.retain_mask(&mask);
    tracing::info!(
        epochs = dates.len(),
        start = %range.start,
        end = %range.end,
        "clipped to analysis period"
    );
    if dates.len() < 3 {
        return Err(PipelineError::NoData(format!(
            "{} acquisitions inside the analysis period",
            dates.len()
        )));
    }

    if plots {
        draw("cross_distance.png", config, |p| plot::plot_cross_distance(p, &dates, &cross))?;
    }

    let location = config.tide.location;
    let tide = compute_tide_dates(model, location, &dates)?;

    if plots {
        let continuous = compute_tide(model, location, &range, config.tide.time_step())?;
        draw("tide_levels.png", config, |p| {
            plot::plot_tide_levels(p, &continuous, &dates, &tide)
        })?;
        draw("timestep_distribution.png", config, |p| {
            plot::plot_timestep_distribution(p, &dates, config.slope.n_days)
        })?;
    }

    let tide_peak = find_tide_peak(&dates, &tide, &config.slope)?;
    let band = config.slope.freqs_max.unwrap_or(tide_peak.band);
    let settings = SlopeSettings {
        freqs_max: Some(band),
        ..config.slope.clone()
    };

    if plots {
        draw("tide_spectrum.png", config, |p| plot::plot_tide_spectrum(p, &tide_peak, band))?;
    }

    let mut estimates = Vec::new();
    let mut skipped = Vec::new();
    for series in cross.iter() {
        match estimate_slope(&series.name, &dates, &series.values, &tide, &settings) {
            Ok(estimate) => {
                if plots {
                    let name = format!("spectrum_{}.png", series.name);
                    draw(&name, config, |p| {
                        plot::plot_transect_spectrum(
                            p,
                            &estimate,
                            &dates,
                            &series.values,
                            &tide,
                            &settings,
                        )
                    })?;
                }
                estimates.push(estimate);
            }
            Err(e) if e.is_data_error() => {
                tracing::warn!(transect = %series.name, error = %e, "skipping transect");
                skipped.push(series.name.clone());
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(path) = &config.output.slope_file {
        write_slope_file(path, &config.site.name, &settings, &estimates)?;
        tracing::info!(path = %path.display(), "wrote slopes");
    }
    if let Some(path) = &config.output.cross_distance_file {
        write_cross_distance_file(path, &dates, &cross)?;
        tracing::info!(path = %path.display(), "wrote cross-shore distances");
    }

    Ok(SlopeReport {
        site: config.site.name.clone(),
        n_images,
        dates,
        cross,
        tide,
        tide_peak,
        band,
        estimates,
        skipped,
    })
}
