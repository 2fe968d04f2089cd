//! End-to-end slope estimation on a synthetic beach.
//!
//! Straight north-south shorelines move cross-shore with a seasonal cycle and
//! with the tide as `-η/β` on a beach of known slope β. Images come every
//! 8 days at the same time of day, so the semidiurnal tide aliases to a
//! ~17-day period that the estimator has to find and remove.

use chrono::{DateTime, Duration, TimeZone, Utc};
use geo::Coord;
use slope_rs::analysis::{DateRange, SECONDS_IN_DAY, SlopeError, TidalBand, timestamp_seconds};
use slope_rs::config::SlopeConfig;
use slope_rs::io::{
    ShorelineDataset, ShorelineRecord, Transect, constituent_period, write_shoreline_file,
    write_transect_file,
};
use slope_rs::pipeline::{self, PipelineError};
use slope_rs::tide::{HarmonicConstituent, HarmonicTideModel, TideModel};
use std::f64::consts::PI;
use tempfile::TempDir;

const TRUE_SLOPE: f64 = 0.1;
const N_EPOCHS: usize = 400;
const TIDE_LOCATION: (f64, f64) = (151.332209, -33.723772);

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
}

fn tide_model() -> HarmonicTideModel {
    HarmonicTideModel::new(
        0.0,
        epoch(),
        vec![
            HarmonicConstituent::new("M2", 0.5, constituent_period("M2").unwrap(), 0.3),
            HarmonicConstituent::new("K1", 0.2, constituent_period("K1").unwrap(), 1.0),
        ],
    )
}

/// Cross-shore shoreline position of transect `offset` at a time.
fn shoreline_position(model: &HarmonicTideModel, date: DateTime<Utc>, offset: f64) -> f64 {
    let elapsed = timestamp_seconds(date) - timestamp_seconds(epoch());
    let years = elapsed / (365.25 * SECONDS_IN_DAY);
    let seasonal = 8.0 * (2.0 * PI * years).sin();
    offset + seasonal - model.evaluate(date) / TRUE_SLOPE
}

/// A north-south shoreline at x = f(y) covering y in [-100, 600].
fn shoreline(x_at: impl Fn(f64) -> f64) -> Vec<Coord<f64>> {
    (0..=350)
        .map(|i| {
            let y = -100.0 + 2.0 * i as f64;
            Coord { x: x_at(y), y }
        })
        .collect()
}

fn record(
    date: DateTime<Utc>,
    satname: &str,
    geoaccuracy: f64,
    points: Vec<Coord<f64>>,
) -> ShorelineRecord {
    ShorelineRecord {
        date,
        satname: satname.to_string(),
        shoreline: points,
        geoaccuracy,
        cloud_cover: Some(0.0),
    }
}

fn acquisition_dates() -> Vec<DateTime<Utc>> {
    let first = Utc.with_ymd_and_hms(2000, 1, 5, 10, 0, 0).unwrap();
    (0..N_EPOCHS).map(|i| first + Duration::days(8 * i as i64)).collect()
}

/// Good images plus records that the filters have to remove.
fn synthetic_dataset(model: &HarmonicTideModel) -> ShorelineDataset {
    let mut records: Vec<ShorelineRecord> = acquisition_dates()
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let x1 = shoreline_position(model, date, 150.0);
            let x2 = shoreline_position(model, date, 180.0);
            let satname = if i % 2 == 0 { "L5" } else { "L7" };
            let points = shoreline(|y| if y < 250.0 { x1 } else { x2 });
            record(date, satname, 5.0, points)
        })
        .collect();

    let garbage = || shoreline(|_| 900.0);
    let day = acquisition_dates()[20];
    // same pass, second image of the day
    records.push(record(day + Duration::minutes(30), "L7", 4.0, garbage()));
    records.push(record(day + Duration::days(3), "S2", 3.0, garbage()));
    records.push(record(day + Duration::days(4), "L8", -1.0, garbage()));
    records.push(record(day + Duration::days(5), "L8", 12.0, garbage()));

    // before the analysis period
    let early = Utc.with_ymd_and_hms(1998, 12, 28, 10, 0, 0).unwrap();
    let x = shoreline_position(model, early, 150.0);
    records.push(record(early, "L5", 5.0, shoreline(|_| x)));

    ShorelineDataset::new(records)
}

fn transects() -> Vec<Transect> {
    vec![
        Transect::new("T1", Coord { x: 0.0, y: 0.0 }, Coord { x: 300.0, y: 0.0 }),
        Transect::new("T2", Coord { x: 0.0, y: 500.0 }, Coord { x: 300.0, y: 500.0 }),
        // nowhere near a shoreline
        Transect::new("T3", Coord { x: 0.0, y: 5000.0 }, Coord { x: 300.0, y: 5000.0 }),
    ]
}

fn quiet_config() -> SlopeConfig {
    let mut config = SlopeConfig::default();
    config.output.plots = false;
    config.tide.location = TIDE_LOCATION;
    config
}

fn assert_slope(found: f64) {
    let half_step = 0.5 * SlopeConfig::default().slope.delta_slope;
    assert!(
        (found - TRUE_SLOPE).abs() < half_step,
        "estimated slope {found}, expected {TRUE_SLOPE}"
    );
}

#[test]
fn test_recovers_known_slope() {
    let model = tide_model();
    let report =
        pipeline::run_with(&quiet_config(), synthetic_dataset(&model), &transects(), &model)
            .unwrap();

    assert_eq!(report.estimates.len(), 2);
    for estimate in &report.estimates {
        assert_slope(estimate.slope);
        assert_eq!(estimate.n_points, N_EPOCHS);
    }
    assert_eq!(report.skipped, vec!["T3".to_string()]);
}

#[test]
fn test_filters_and_clipping() {
    let model = tide_model();
    let report =
        pipeline::run_with(&quiet_config(), synthetic_dataset(&model), &transects(), &model)
            .unwrap();

    // duplicate, S2, failed and poor georeferencing removed; early image kept
    assert_eq!(report.n_images, N_EPOCHS + 1);
    // early image clipped
    assert_eq!(report.dates, acquisition_dates());
    assert_eq!(report.tide.len(), N_EPOCHS);

    let t1 = report.cross.get("T1").unwrap();
    assert_eq!(t1.len(), N_EPOCHS);
    for (&date, &x) in report.dates.iter().zip(t1) {
        assert!((x - shoreline_position(&model, date, 150.0)).abs() < 1e-9);
    }
    assert!(report.cross.get("T3").unwrap().iter().all(|v| v.is_nan()));
}

#[test]
fn test_tide_peak_is_aliased_semidiurnal() {
    let model = tide_model();
    let report =
        pipeline::run_with(&quiet_config(), synthetic_dataset(&model), &transects(), &model)
            .unwrap();

    // M2 sampled every 8 days aliases to a period of about 17.5 days
    let period_days = 1.0 / (report.tide_peak.peak_frequency * SECONDS_IN_DAY);
    assert!(
        (17.0..18.0).contains(&period_days),
        "peak period {period_days} days"
    );
    assert!(report.band.contains(report.tide_peak.peak_frequency));
    assert_eq!(report.band, report.tide_peak.band);
}

#[test]
fn test_configured_band_is_used() {
    let model = tide_model();
    let f = 1.0 / (17.46 * SECONDS_IN_DAY);
    let band = TidalBand::around(f, 2e-8);

    let mut config = quiet_config();
    config.slope.freqs_max = Some(band);
    let report =
        pipeline::run_with(&config, synthetic_dataset(&model), &transects(), &model).unwrap();

    assert_eq!(report.band, band);
    for estimate in &report.estimates {
        assert_slope(estimate.slope);
    }
}

#[test]
fn test_short_transect_record_is_skipped() {
    let model = tide_model();
    let mut records = synthetic_dataset(&model).records;
    // twelve daily images that only reach a transect far to the north
    let first = Utc.with_ymd_and_hms(2010, 3, 1, 10, 0, 0).unwrap();
    for day in 0..12 {
        let date = first + Duration::days(day);
        let x = shoreline_position(&model, date, 100.0);
        let points = (0..=50)
            .map(|i| Coord { x, y: 2950.0 + 2.0 * i as f64 })
            .collect();
        records.push(record(date, "L8", 5.0, points));
    }
    let dataset = ShorelineDataset::new(records);
    let mut transects = transects();
    transects.push(Transect::new(
        "T4",
        Coord { x: 0.0, y: 3000.0 },
        Coord { x: 300.0, y: 3000.0 },
    ));

    let report = pipeline::run_with(&quiet_config(), dataset, &transects, &model).unwrap();

    let t4 = report.cross.get("T4").unwrap();
    assert_eq!(t4.iter().filter(|v| !v.is_nan()).count(), 12);
    // eleven days is too short a record for an 8-day sampling period
    assert_eq!(report.skipped, vec!["T3".to_string(), "T4".to_string()]);
    assert_eq!(report.estimates.len(), 2);
    for estimate in &report.estimates {
        assert_slope(estimate.slope);
        assert_eq!(estimate.n_points, N_EPOCHS);
    }
}

#[test]
fn test_invalid_slope_range_is_an_error() {
    let model = tide_model();
    let mut config = quiet_config();
    config.slope.delta_slope = 0.0;

    let result = pipeline::run_with(&config, synthetic_dataset(&model), &transects(), &model);
    assert!(matches!(
        result,
        Err(PipelineError::Slope(SlopeError::InvalidRange { .. }))
    ));
}

#[test]
fn test_writes_figures() {
    let dir = TempDir::new().unwrap();
    let model = tide_model();
    let mut config = quiet_config();
    config.output.plots = true;
    config.output.plot_dir = dir.path().join("figures");

    let report =
        pipeline::run_with(&config, synthetic_dataset(&model), &transects(), &model).unwrap();
    assert_eq!(report.estimates.len(), 2);

    for name in [
        "shorelines.png",
        "cross_distance.png",
        "tide_levels.png",
        "timestep_distribution.png",
        "tide_spectrum.png",
        "spectrum_T1.png",
        "spectrum_T2.png",
    ] {
        let path = config.output.plot_dir.join(name);
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        assert!(size > 0, "missing figure {}", path.display());
    }
    // skipped transects get no spectrum figure
    assert!(!config.output.plot_dir.join("spectrum_T3.png").exists());
}

#[test]
fn test_no_data_in_period() {
    let model = tide_model();
    let mut config = quiet_config();
    config.slope.date_range = DateRange::new(
        Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap(),
    );

    let result = pipeline::run_with(&config, synthetic_dataset(&model), &transects(), &model);
    assert!(matches!(result, Err(PipelineError::NoData(_))));
}

#[test]
fn test_tide_location_mismatch() {
    let model = tide_model().with_location(151.3, -33.7);
    let mut config = quiet_config();
    config.tide.location = (140.0, -33.7);

    let result = pipeline::run_with(&config, synthetic_dataset(&model), &transects(), &model);
    assert!(matches!(result, Err(PipelineError::Tide(_))));
}

#[test]
fn test_run_from_files() {
    let dir = TempDir::new().unwrap();
    let model = tide_model();

    let shoreline_file = dir.path().join("SYNTH_output.json");
    write_shoreline_file(&shoreline_file, &synthetic_dataset(&model)).unwrap();
    let transect_file = dir.path().join("SYNTH_transects.geojson");
    write_transect_file(&transect_file, &transects()[..2]).unwrap();

    let constituents = format!(
        "# Synthetic constituents\n\
         # location: {} {}\n\
         # reference_level: 0.0\n\
         # epoch: 2000-01-01T00:00:00Z\n\
         M2 0.5 {}\n\
         K1 0.2 {}\n",
        TIDE_LOCATION.0,
        TIDE_LOCATION.1,
        0.3_f64.to_degrees(),
        1.0_f64.to_degrees()
    );
    std::fs::write(dir.path().join("SYNTH_constituents.txt"), constituents).unwrap();

    let slope_file = dir.path().join("slopes.txt");
    let cross_file = dir.path().join("cross.csv");
    let toml = format!(
        r#"
[site]
name = "SYNTH"
data_dir = "{}"

[tide]
location = [{}, {}]

[tide.source]
kind = "harmonic"
constituents = "SYNTH_constituents.txt"

[output]
plots = false
slope_file = "{}"
cross_distance_file = "{}"
"#,
        dir.path().display(),
        TIDE_LOCATION.0,
        TIDE_LOCATION.1,
        slope_file.display(),
        cross_file.display()
    );
    let config_path = dir.path().join("run.toml");
    std::fs::write(&config_path, toml).unwrap();

    let config = SlopeConfig::load(&config_path).unwrap();
    let model: Box<dyn TideModel> = pipeline::build_tide_model(&config).unwrap();
    assert!(model.describe().contains("M2"));

    let report = pipeline::run(&config).unwrap();
    assert_eq!(report.site, "SYNTH");
    assert_eq!(report.estimates.len(), 2);
    for estimate in &report.estimates {
        assert_slope(estimate.slope);
    }

    let slopes = std::fs::read_to_string(&slope_file).unwrap();
    assert!(slopes.starts_with("# Beach slopes"));
    assert!(slopes.contains("# site: SYNTH"));
    assert!(slopes.contains(&format!("T1 0.100 {N_EPOCHS}")));
    assert!(slopes.contains(&format!("T2 0.100 {N_EPOCHS}")));

    let cross = std::fs::read_to_string(&cross_file).unwrap();
    let mut lines = cross.lines();
    assert!(lines.next().unwrap().ends_with("T1,T2"));
    assert_eq!(lines.count(), N_EPOCHS);
}

#[test]
fn test_missing_inputs() {
    let dir = TempDir::new().unwrap();
    let mut config = quiet_config();
    config.site.data_dir = dir.path().to_path_buf();

    let result = pipeline::run(&config);
    assert!(matches!(result, Err(PipelineError::Shoreline(_))));
}
