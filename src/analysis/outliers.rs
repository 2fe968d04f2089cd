//! Despiking of cross-shore distance series.

use super::intersection::{CrossDistances, IntersectionSettings};

/// Whether the point at `i` is a spike relative to its neighbours.
fn is_outlier(values: &[f64], i: usize, max_change: f64) -> bool {
    let n = values.len();
    if i == 0 {
        (values[0] - values[1]).abs() > max_change
    } else if i == n - 1 {
        (values[n - 1] - values[n - 2]).abs() > max_change
    } else {
        let before = values[i] - values[i - 1];
        let after = values[i] - values[i + 1];
        before.abs() > max_change && after.abs() > max_change && before.signum() == after.signum()
    }
}

/// Indices of the values kept after iterative despiking.
///
/// Each pass scans from the start and removes the first spike it finds;
/// passes repeat until one finds none. An interior point is a spike when it
/// differs from both neighbours by more than `max_change` in the same
/// direction, so a step shared by consecutive points is kept. The end points
/// only have one neighbour to compare with.
pub fn identify_outliers(values: &[f64], max_change: f64) -> Vec<usize> {
    let mut kept: Vec<usize> = (0..values.len()).collect();
    let mut current: Vec<f64> = values.to_vec();

    while current.len() >= 2 {
        match (0..current.len()).find(|&i| is_outlier(&current, i, max_change)) {
            Some(i) => {
                current.remove(i);
                kept.remove(i);
            }
            None => break,
        }
    }

    kept
}

/// Replace spikes in every transect series with NaN.
///
/// NaN values are skipped when looking for spikes. Series with fewer than
/// two valid values are left unchanged.
pub fn reject_outliers(cross: &mut CrossDistances, settings: &IntersectionSettings) {
    for series in cross.iter_mut() {
        let valid_idx: Vec<usize> = series
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, _)| i)
            .collect();
        if valid_idx.len() < 2 {
            continue;
        }

        let valid: Vec<f64> = valid_idx.iter().map(|&i| series.values[i]).collect();
        let kept = identify_outliers(&valid, settings.max_cross_change);

        let mut keep = vec![false; valid.len()];
        for &k in &kept {
            keep[k] = true;
        }
        for (&idx, keep) in valid_idx.iter().zip(keep) {
            if !keep {
                series.values[idx] = f64::NAN;
            }
        }

        let removed = valid.len() - kept.len();
        if removed > 0 {
            tracing::debug!(transect = %series.name, removed, "despiked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_spike_removed() {
        let values = [10.0, 12.0, 80.0, 11.0, 13.0];
        assert_eq!(identify_outliers(&values, 40.0), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_step_is_kept() {
        // Shoreline advances and stays: both sides of the step have a neighbour
        let values = [10.0, 11.0, 70.0, 72.0, 71.0];
        assert_eq!(identify_outliers(&values, 40.0).len(), 5);
    }

    #[test]
    fn test_dip_removed() {
        let values = [50.0, 52.0, -10.0, 51.0];
        assert_eq!(identify_outliers(&values, 40.0), vec![0, 1, 3]);
    }

    #[test]
    fn test_end_points() {
        let values = [100.0, 10.0, 12.0, 11.0, 90.0];
        assert_eq!(identify_outliers(&values, 40.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_repeated_passes() {
        // Removing the first spike exposes the second
        let values = [10.0, 12.0, 60.0, 110.0, 11.0, 13.0];
        let kept = identify_outliers(&values, 40.0);
        assert_eq!(kept, vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_short_series_unchanged() {
        assert_eq!(identify_outliers(&[5.0], 1.0), vec![0]);
        assert!(identify_outliers(&[], 1.0).is_empty());
    }

    #[test]
    fn test_reject_outliers_skips_nan() {
        let mut cross = CrossDistances::new();
        cross.push("A", vec![10.0, f64::NAN, 12.0, 90.0, 11.0]);
        cross.push("B", vec![f64::NAN, 5.0, f64::NAN]);

        reject_outliers(&mut cross, &IntersectionSettings::default());

        let a = cross.get("A").unwrap();
        assert_eq!(a[0], 10.0);
        assert!(a[1].is_nan());
        assert!(a[3].is_nan());
        assert_eq!(a[4], 11.0);

        let b = cross.get("B").unwrap();
        assert_eq!(b[1], 5.0);
    }
}
