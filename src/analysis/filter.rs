//! Filters applied to the shoreline dataset before intersection.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use super::DateRange;
use crate::io::{GEOREF_FAILED, ShorelineDataset};

/// Remove all records from one satellite mission (exact name match).
///
/// Returns the number of records removed.
pub fn remove_satellite(dataset: &mut ShorelineDataset, satname: &str) -> usize {
    let removed = dataset.retain(|r| r.satname != satname);
    tracing::debug!(satname, removed, "removed satellite records");
    removed
}

/// Remove records acquired on the same UTC day as an earlier record.
///
/// Overlapping image footprints produce several shorelines for one pass;
/// the first record of each day is kept. Returns the number removed.
pub fn remove_duplicates(dataset: &mut ShorelineDataset) -> usize {
    let mut seen: HashSet<NaiveDate> = HashSet::new();
    let removed = dataset.retain(|r| seen.insert(r.date.date_naive()));
    tracing::info!(removed, "duplicates");
    removed
}

/// Remove records with failed or poor georeferencing.
///
/// A record is dropped when its accuracy is the failure flag (-1) or
/// `>= threshold` metres. Returns the number removed.
pub fn remove_inaccurate_georef(dataset: &mut ShorelineDataset, threshold: f64) -> usize {
    let removed = dataset.retain(|r| r.geoaccuracy != GEOREF_FAILED && r.geoaccuracy < threshold);
    tracing::info!(removed, threshold, "bad georef");
    removed
}

/// Dates strictly inside `range`, with the mask selecting them.
///
/// The mask has one entry per input date and is used to clip the
/// cross-distance series the same way.
pub fn clip_dates(dates: &[DateTime<Utc>], range: &DateRange) -> (Vec<DateTime<Utc>>, Vec<bool>) {
    let mask: Vec<bool> = dates.iter().map(|&d| range.contains(d)).collect();
    let kept = dates
        .iter()
        .zip(&mask)
        .filter(|(_, keep)| **keep)
        .map(|(d, _)| *d)
        .collect();
    (kept, mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ShorelineRecord;
    use chrono::TimeZone;

    fn record(day: u32, hour: u32, satname: &str, geoaccuracy: f64) -> ShorelineRecord {
        ShorelineRecord {
            date: Utc.with_ymd_and_hms(2005, 3, day, hour, 0, 0).unwrap(),
            satname: satname.to_string(),
            shoreline: Vec::new(),
            geoaccuracy,
            cloud_cover: None,
        }
    }

    #[test]
    fn test_remove_satellite() {
        let mut ds = ShorelineDataset::new(vec![
            record(1, 0, "L8", 5.0),
            record(2, 0, "S2", 5.0),
            record(3, 0, "S2A", 5.0),
        ]);
        assert_eq!(remove_satellite(&mut ds, "S2"), 1);
        assert_eq!(ds.len(), 2);
        assert!(!ds.has_satellite("S2"));
        assert!(ds.has_satellite("S2A"));
    }

    #[test]
    fn test_remove_duplicates_keeps_first_of_day() {
        let mut ds = ShorelineDataset::new(vec![
            record(1, 10, "L7", 5.0),
            record(1, 0, "L5", 5.0),
            record(1, 23, "L7", 5.0),
            record(2, 0, "L5", 5.0),
        ]);
        assert_eq!(remove_duplicates(&mut ds), 2);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].satname, "L5");
        assert_eq!(ds.records[1].date.format("%d").to_string(), "02");
    }

    #[test]
    fn test_remove_inaccurate_georef() {
        let mut ds = ShorelineDataset::new(vec![
            record(1, 0, "L5", 4.0),
            record(2, 0, "L5", GEOREF_FAILED),
            record(3, 0, "L5", 10.0),
            record(4, 0, "L5", 12.5),
            record(5, 0, "L5", 9.99),
        ]);
        assert_eq!(remove_inaccurate_georef(&mut ds, 10.0), 3);
        let acc: Vec<f64> = ds.records.iter().map(|r| r.geoaccuracy).collect();
        assert_eq!(acc, vec![4.0, 9.99]);
    }

    #[test]
    fn test_clip_dates() {
        let dates: Vec<DateTime<Utc>> = (1..=4)
            .map(|d| Utc.with_ymd_and_hms(2005, 3, d, 0, 0, 0).unwrap())
            .collect();
        let range = DateRange::new(dates[0], dates[3]);

        let (kept, mask) = clip_dates(&dates, &range);
        assert_eq!(kept, vec![dates[1], dates[2]]);
        assert_eq!(mask, vec![false, true, true, false]);
    }
}
