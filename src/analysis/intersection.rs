//! Shoreline / transect intersection.
//!
//! Satellite shorelines are clouds of points, so a transect rarely crosses
//! one cleanly. The cross-shore distance is instead taken from the shoreline
//! points that lie within a band around the transect: the points are
//! rotated into the transect frame and the median chainage is used. Epochs
//! where those chainages are widely spread (a shoreline folding back on
//! itself, wet/dry sand confusion, clouds) are flagged by their standard
//! deviation and range.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::io::{ShorelineDataset, Transect};

/// What to do with epochs whose intersection is too dispersed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMode {
    /// Replace with NaN
    Nan,
    /// Use the most seaward chainage
    Max,
    /// `Max` when more than `prc_std` of the epochs are dispersed, otherwise `Nan`
    Auto,
}

/// Parameters for intersection and outlier rejection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionSettings {
    /// Along-shore half-width of the band around the transect (m)
    pub along_dist: f64,
    /// Largest standard deviation of chainages in the band (m)
    pub max_std: f64,
    /// Largest range (max − min) of chainages in the band (m)
    pub max_range: f64,
    /// Most landward chainage accepted (m, usually negative)
    pub min_val: f64,
    /// Points farther than this from the transect origin are ignored (m)
    pub max_origin_distance: f64,
    /// Handling of dispersed intersections
    #[serde(rename = "nan_max")]
    pub outlier_mode: OutlierMode,
    /// Fraction of dispersed epochs above which `Auto` switches to `Max`
    pub prc_std: f64,
    /// Largest cross-shore change between consecutive epochs before a point is a spike (m)
    pub max_cross_change: f64,
}

impl Default for IntersectionSettings {
    fn default() -> Self {
        Self {
            along_dist: 25.0,
            max_std: 15.0,
            max_range: 30.0,
            min_val: -100.0,
            max_origin_distance: 1000.0,
            outlier_mode: OutlierMode::Auto,
            prc_std: 0.1,
            max_cross_change: 40.0,
        }
    }
}

/// Cross-shore distances along one transect, one value per epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct TransectSeries {
    /// Transect identifier
    pub name: String,
    /// Chainage per epoch, NaN where missing
    pub values: Vec<f64>,
}

impl TransectSeries {
    /// Number of non-NaN values.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Cross-shore distance series for every transect, in transect order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CrossDistances {
    series: Vec<TransectSeries>,
}

impl CrossDistances {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the series of a transect.
    pub fn push(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.push(TransectSeries {
            name: name.into(),
            values,
        });
    }

    /// Series for a transect.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    /// Iterate over the series.
    pub fn iter(&self) -> impl Iterator<Item = &TransectSeries> {
        self.series.iter()
    }

    /// Mutable iteration over the series.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TransectSeries> {
        self.series.iter_mut()
    }

    /// Number of transects.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Check if there are no transects.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Keep the epochs whose mask entry is true, in every series.
    pub fn retain_mask(&mut self, mask: &[bool]) {
        for s in &mut self.series {
            s.values = s
                .values
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(v, _)| *v)
                .collect();
        }
    }
}

/// Dispersion statistics of the chainages near a transect for one epoch.
#[derive(Clone, Copy, Debug)]
struct IntersectionStats {
    median: f64,
    std: f64,
    max: f64,
    min: f64,
}

impl IntersectionStats {
    const MISSING: Self = Self {
        median: f64::NAN,
        std: f64::NAN,
        max: f64::NAN,
        min: f64::NAN,
    };

    fn from_chainages(mut chainages: Vec<f64>) -> Self {
        if chainages.is_empty() {
            return Self::MISSING;
        }
        chainages.sort_by(f64::total_cmp);

        let n = chainages.len();
        let median = if n % 2 == 1 {
            chainages[n / 2]
        } else {
            0.5 * (chainages[n / 2 - 1] + chainages[n / 2])
        };
        let mean = chainages.iter().sum::<f64>() / n as f64;
        let variance = chainages.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n as f64;

        Self {
            median,
            std: variance.sqrt(),
            max: chainages[n - 1],
            min: chainages[0],
        }
    }

    fn is_compact(&self, settings: &IntersectionSettings) -> bool {
        self.std <= settings.max_std && (self.max - self.min) <= settings.max_range
    }
}

/// Chainages of the shoreline points close to a transect.
fn chainages_near(
    transect: &Transect,
    shoreline: &[Coord<f64>],
    settings: &IntersectionSettings,
) -> Vec<f64> {
    let origin = transect.origin;
    let length = transect.length();
    let phi = transect.angle();
    let (sin_phi, cos_phi) = phi.sin_cos();

    shoreline
        .iter()
        .filter_map(|&p| {
            let d = p - origin;
            // along-transect and across-transect components
            let along = cos_phi * d.x + sin_phi * d.y;
            let across = -sin_phi * d.x + cos_phi * d.y;
            let from_origin = d.x.hypot(d.y);

            let close = across.abs() <= settings.along_dist
                && from_origin <= settings.max_origin_distance
                && length > 0.0;
            (close && along >= settings.min_val).then_some(along)
        })
        .collect()
}

/// Cross-shore distance along each transect for every record in the dataset.
///
/// Epochs where no shoreline point falls near a transect are NaN. Dispersed
/// intersections are handled according to `settings.outlier_mode`.
pub fn compute_intersection(
    dataset: &ShorelineDataset,
    transects: &[Transect],
    settings: &IntersectionSettings,
) -> CrossDistances {
    let mut cross = CrossDistances::new();

    for transect in transects {
        let stats: Vec<IntersectionStats> = dataset
            .records
            .iter()
            .map(|r| chainages_near(transect, &r.shoreline, settings))
            .map(IntersectionStats::from_chainages)
            .collect();

        let n_dispersed = stats.iter().filter(|s| s.std > settings.max_std).count();
        let use_max = match settings.outlier_mode {
            OutlierMode::Nan => false,
            OutlierMode::Max => true,
            OutlierMode::Auto => {
                !stats.is_empty() && (n_dispersed as f64 / stats.len() as f64) > settings.prc_std
            }
        };

        let values: Vec<f64> = stats
            .iter()
            .map(|s| {
                if s.is_compact(settings) {
                    s.median
                } else if use_max {
                    s.max
                } else {
                    f64::NAN
                }
            })
            .collect();

        let valid = values.iter().filter(|v| !v.is_nan()).count();
        tracing::debug!(
            transect = %transect.name,
            valid,
            dispersed = n_dispersed,
            use_max,
            "computed intersections"
        );

        cross.push(transect.name.clone(), values);
    }

    cross
}
