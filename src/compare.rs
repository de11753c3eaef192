//! Cross-model divergence checks.
//!
//! Records are joined on their ETA as integer epoch seconds. Timestamps seen
//! on only one side are dropped. A timestamp repeated on a side (the shared
//! waypoint between two legs) joins with every match on the other side.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::sampling::SampleRecord;

/// Disagreement thresholds between two models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonThresholds {
    #[serde(default = "default_wind_speed_kt")]
    pub wind_speed_kt: f64,
    #[serde(default = "default_swh_m")]
    pub swh_m: f64,
}

impl Default for ComparisonThresholds {
    fn default() -> Self {
        Self {
            wind_speed_kt: default_wind_speed_kt(),
            swh_m: default_swh_m(),
        }
    }
}

fn default_wind_speed_kt() -> f64 {
    10.0
}

fn default_swh_m() -> f64 {
    1.5
}

/// Notes for every variable whose aligned difference exceeds its threshold
pub fn compare_models(
    series_a: &[SampleRecord],
    series_b: &[SampleRecord],
    thresholds: &ComparisonThresholds,
) -> Vec<String> {
    let mut notes = Vec::new();
    if series_a.is_empty() || series_b.is_empty() {
        return notes;
    }

    let pairs = align(series_a, series_b);
    if pairs.is_empty() {
        return notes;
    }

    if let Some(diff) = max_abs_diff(&pairs, |r| r.wind_speed_kt) {
        if diff > thresholds.wind_speed_kt {
            notes.push(format!(
                "Wind speed disagreement >{} kt (max diff {:.1})",
                thresholds.wind_speed_kt, diff
            ));
        }
    }

    if let Some(diff) = max_abs_diff(&pairs, |r| r.sig_wave_height_m) {
        if diff > thresholds.swh_m {
            notes.push(format!(
                "Wave height disagreement >{} m (max diff {:.1})",
                thresholds.swh_m, diff
            ));
        }
    }

    notes
}

/// Inner join on epoch seconds, in the order of `series_a`
fn align<'a>(
    series_a: &'a [SampleRecord],
    series_b: &'a [SampleRecord],
) -> Vec<(&'a SampleRecord, &'a SampleRecord)> {
    let mut by_time: BTreeMap<i64, Vec<&SampleRecord>> = BTreeMap::new();
    for record in series_b {
        by_time
            .entry(record.time_utc().timestamp())
            .or_default()
            .push(record);
    }

    series_a
        .iter()
        .flat_map(|a| {
            by_time
                .get(&a.time_utc().timestamp())
                .into_iter()
                .flatten()
                .map(move |&b| (a, b))
        })
        .collect()
}

/// Largest absolute difference over pairs where both sides carry the variable
fn max_abs_diff<F>(pairs: &[(&SampleRecord, &SampleRecord)], value: F) -> Option<f64>
where
    F: Fn(&SampleRecord) -> Option<f64>,
{
    pairs
        .iter()
        .filter_map(|&(a, b)| Some((value(a)? - value(b)?).abs()))
        .reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackPoint;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn record(offset_secs: i64, wind: Option<f64>, swh: Option<f64>) -> SampleRecord {
        let mut record = SampleRecord::new(
            TrackPoint {
                label: "leg".to_string(),
                lat: 29.5,
                lon: -94.0,
                time_utc: start() + Duration::seconds(offset_secs),
            },
            0,
        );
        record.wind_speed_kt = wind;
        record.sig_wave_height_m = swh;
        record
    }

    #[test]
    fn test_wind_disagreement() {
        let gfs = vec![record(0, Some(10.0), None), record(3600, Some(15.0), None)];
        let ecmwf = vec![record(0, Some(22.0), None), record(3600, Some(14.0), None)];

        let notes = compare_models(&gfs, &ecmwf, &ComparisonThresholds::default());
        assert_eq!(
            notes,
            vec!["Wind speed disagreement >10 kt (max diff 12.0)".to_string()]
        );
    }

    #[test]
    fn test_wave_disagreement() {
        let gfs = vec![record(0, Some(10.0), Some(0.5))];
        let ecmwf = vec![record(0, Some(12.0), Some(2.2))];

        let notes = compare_models(&gfs, &ecmwf, &ComparisonThresholds::default());
        assert_eq!(
            notes,
            vec!["Wave height disagreement >1.5 m (max diff 1.7)".to_string()]
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let gfs = vec![record(0, Some(10.0), Some(1.0))];
        let ecmwf = vec![record(0, Some(20.0), Some(2.5))];
        assert!(compare_models(&gfs, &ecmwf, &ComparisonThresholds::default()).is_empty());
    }

    #[test]
    fn test_unmatched_timestamps_are_dropped() {
        let gfs = vec![record(0, Some(10.0), None), record(1, Some(40.0), None)];
        let ecmwf = vec![record(0, Some(12.0), None), record(3600, Some(0.0), None)];
        assert!(compare_models(&gfs, &ecmwf, &ComparisonThresholds::default()).is_empty());

        let disjoint = vec![record(7200, Some(50.0), None)];
        assert!(compare_models(&gfs, &disjoint, &ComparisonThresholds::default()).is_empty());
    }

    #[test]
    fn test_duplicate_timestamps_join_every_pair() {
        let gfs = vec![record(0, Some(10.0), None), record(0, Some(30.0), None)];
        let ecmwf = vec![record(0, Some(10.0), None)];

        let notes = compare_models(&gfs, &ecmwf, &ComparisonThresholds::default());
        assert_eq!(
            notes,
            vec!["Wind speed disagreement >10 kt (max diff 20.0)".to_string()]
        );
    }

    #[test]
    fn test_empty_and_partial_inputs() {
        let gfs = vec![record(0, Some(10.0), None)];
        assert!(compare_models(&[], &gfs, &ComparisonThresholds::default()).is_empty());
        assert!(compare_models(&gfs, &[], &ComparisonThresholds::default()).is_empty());

        let no_wind = vec![record(0, None, Some(1.0))];
        assert!(compare_models(&gfs, &no_wind, &ComparisonThresholds::default()).is_empty());
    }
}
