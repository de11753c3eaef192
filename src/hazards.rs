//! Rule-based hazard detection and go/no-go classification.
//!
//! Rules run in a fixed order and are independent of each other. A rule whose
//! variable is absent from every record is skipped. For the risk level,
//! absent variables count as zero.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sampling::SampleRecord;

/// Thresholds for hazard notes and risk levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardThresholds {
    /// Max wind at or above this raises the strong wind note
    #[serde(default = "default_strong_wind_kt")]
    pub strong_wind_kt: f64,
    /// Gust / wind ratio above this is squally
    #[serde(default = "default_gust_factor")]
    pub gust_factor: f64,
    /// Wave height jump between consecutive points, as a fraction of the earlier value
    #[serde(default = "default_wave_jump_ratio")]
    pub wave_jump_ratio: f64,
    #[serde(default = "default_heavy_precip_rate")]
    pub heavy_precip_rate: f64,
    #[serde(default = "default_cape")]
    pub cape: f64,
    /// Go requires max wind strictly below this
    #[serde(default = "default_go_wind_kt")]
    pub go_wind_kt: f64,
    /// Go requires max wave height strictly below this
    #[serde(default = "default_go_swh_m")]
    pub go_swh_m: f64,
    #[serde(default = "default_caution_wind_kt")]
    pub caution_wind_kt: f64,
    #[serde(default = "default_caution_swh_m")]
    pub caution_swh_m: f64,
    #[serde(default = "default_caution_gust_kt")]
    pub caution_gust_kt: f64,
}

impl Default for HazardThresholds {
    fn default() -> Self {
        Self {
            strong_wind_kt: default_strong_wind_kt(),
            gust_factor: default_gust_factor(),
            wave_jump_ratio: default_wave_jump_ratio(),
            heavy_precip_rate: default_heavy_precip_rate(),
            cape: default_cape(),
            go_wind_kt: default_go_wind_kt(),
            go_swh_m: default_go_swh_m(),
            caution_wind_kt: default_caution_wind_kt(),
            caution_swh_m: default_caution_swh_m(),
            caution_gust_kt: default_caution_gust_kt(),
        }
    }
}

fn default_strong_wind_kt() -> f64 {
    25.0
}

fn default_gust_factor() -> f64 {
    1.25
}

fn default_wave_jump_ratio() -> f64 {
    0.5
}

fn default_heavy_precip_rate() -> f64 {
    2e-4
}

fn default_cape() -> f64 {
    1000.0
}

fn default_go_wind_kt() -> f64 {
    15.0
}

fn default_go_swh_m() -> f64 {
    1.2
}

fn default_caution_wind_kt() -> f64 {
    25.0
}

fn default_caution_swh_m() -> f64 {
    2.5
}

fn default_caution_gust_kt() -> f64 {
    35.0
}

/// Go/no-go classification of a sample series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Go")]
    Go,
    #[serde(rename = "Caution")]
    Caution,
    #[serde(rename = "No-Go")]
    NoGo,
    #[serde(rename = "No data")]
    NoData,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Go => "Go",
            RiskLevel::Caution => "Caution",
            RiskLevel::NoGo => "No-Go",
            RiskLevel::NoData => "No data",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Peak values of a series; absent variables are 0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub max_wind_kt: f64,
    pub max_gust_kt: f64,
    pub max_swh_m: f64,
}

/// Peak wind, gust and wave height of a series
pub fn summarize_series(series: &[SampleRecord]) -> SeriesSummary {
    SeriesSummary {
        max_wind_kt: max_of(series, |r| r.wind_speed_kt).unwrap_or(0.0),
        max_gust_kt: max_of(series, |r| r.gust_kt).unwrap_or(0.0),
        max_swh_m: max_of(series, |r| r.sig_wave_height_m).unwrap_or(0.0),
    }
}

/// Maximum of the present values, `None` when the variable is absent everywhere
fn max_of<F>(series: &[SampleRecord], value: F) -> Option<f64>
where
    F: Fn(&SampleRecord) -> Option<f64>,
{
    series.iter().filter_map(value).reduce(f64::max)
}

/// Hazard notes for a series, in rule order
pub fn detect_hazards(series: &[SampleRecord], thresholds: &HazardThresholds) -> Vec<String> {
    let mut notes = Vec::new();

    if let Some(max_wind) = max_of(series, |r| r.wind_speed_kt) {
        if max_wind >= thresholds.strong_wind_kt {
            notes.push(format!(
                "Strong winds >{} kt expected",
                thresholds.strong_wind_kt
            ));
        }
    }

    let gust_factor = max_of(series, |r| match (r.gust_kt, r.wind_speed_kt) {
        (Some(gust), Some(wind)) => Some(gust / wind.max(1.0)),
        _ => None,
    });
    if let Some(factor) = gust_factor {
        if factor > thresholds.gust_factor {
            notes.push(format!(
                "Elevated gust factor > {} (squally)",
                thresholds.gust_factor
            ));
        }
    }

    let rapid_rise = series.windows(2).any(|pair| {
        match (pair[0].sig_wave_height_m, pair[1].sig_wave_height_m) {
            (Some(prev), Some(next)) => next - prev > prev * thresholds.wave_jump_ratio,
            _ => false,
        }
    });
    if rapid_rise {
        notes.push("Rapid wave height increase".to_string());
    }

    if let Some(max_prate) = max_of(series, |r| r.precip_rate) {
        if max_prate > thresholds.heavy_precip_rate {
            notes.push("Heavy precipitation potential".to_string());
        }
    }

    if let Some(max_cape) = max_of(series, |r| r.cape) {
        if max_cape > thresholds.cape {
            notes.push(format!(
                "Convective instability (CAPE > {})",
                thresholds.cape
            ));
        }
    }

    notes
}

/// Classify a series; an empty series has no data
pub fn risk_assessment(series: &[SampleRecord], thresholds: &HazardThresholds) -> RiskLevel {
    if series.is_empty() {
        return RiskLevel::NoData;
    }
    let summary = summarize_series(series);

    if summary.max_wind_kt < thresholds.go_wind_kt && summary.max_swh_m < thresholds.go_swh_m {
        RiskLevel::Go
    } else if summary.max_wind_kt < thresholds.caution_wind_kt
        && summary.max_swh_m < thresholds.caution_swh_m
        && summary.max_gust_kt < thresholds.caution_gust_kt
    {
        RiskLevel::Caution
    } else {
        RiskLevel::NoGo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackPoint;
    use chrono::{Duration, TimeZone, Utc};

    fn series(len: usize) -> Vec<SampleRecord> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                SampleRecord::new(
                    TrackPoint {
                        label: "leg".to_string(),
                        lat: 29.5,
                        lon: -94.0,
                        time_utc: start + Duration::hours(i as i64),
                    },
                    0,
                )
            })
            .collect()
    }

    fn with_wind(winds: &[f64]) -> Vec<SampleRecord> {
        let mut records = series(winds.len());
        for (record, &wind) in records.iter_mut().zip(winds) {
            record.wind_speed_kt = Some(wind);
        }
        records
    }

    #[test]
    fn test_strong_winds_are_no_go() {
        let records = with_wind(&[12.0, 30.0, 18.0]);
        let thresholds = HazardThresholds::default();

        let hazards = detect_hazards(&records, &thresholds);
        assert!(hazards.contains(&"Strong winds >25 kt expected".to_string()));
        assert_eq!(risk_assessment(&records, &thresholds), RiskLevel::NoGo);
    }

    #[test]
    fn test_calm_series_is_go() {
        let mut records = with_wind(&[6.0, 10.0, 8.0]);
        for record in &mut records {
            record.sig_wave_height_m = Some(0.8);
        }
        records[1].sig_wave_height_m = Some(1.0);

        let thresholds = HazardThresholds::default();
        assert!(detect_hazards(&records, &thresholds).is_empty());
        assert_eq!(risk_assessment(&records, &thresholds), RiskLevel::Go);
    }

    #[test]
    fn test_strong_wind_boundary_is_inclusive() {
        let records = with_wind(&[25.0]);
        let hazards = detect_hazards(&records, &HazardThresholds::default());
        assert_eq!(hazards, vec!["Strong winds >25 kt expected".to_string()]);
    }

    #[test]
    fn test_gust_factor() {
        let mut records = with_wind(&[10.0, 0.5]);
        records[0].gust_kt = Some(12.0);
        // Wind below 1 kt is clamped to 1 before dividing.
        records[1].gust_kt = Some(1.2);
        assert!(detect_hazards(&records, &HazardThresholds::default()).is_empty());

        records[0].gust_kt = Some(13.0);
        assert_eq!(
            detect_hazards(&records, &HazardThresholds::default()),
            vec!["Elevated gust factor > 1.25 (squally)".to_string()]
        );
    }

    #[test]
    fn test_gust_without_wind_is_skipped() {
        let mut records = series(2);
        records[0].gust_kt = Some(40.0);
        assert!(detect_hazards(&records, &HazardThresholds::default()).is_empty());
    }

    #[test]
    fn test_rapid_wave_increase() {
        let mut records = series(4);
        records[0].sig_wave_height_m = Some(1.0);
        records[1].sig_wave_height_m = Some(1.4);
        records[2].sig_wave_height_m = None;
        records[3].sig_wave_height_m = Some(3.0);
        // The gap breaks the pair, so 1.4 -> 3.0 is not compared.
        assert!(detect_hazards(&records, &HazardThresholds::default()).is_empty());

        records[2].sig_wave_height_m = Some(1.5);
        assert_eq!(
            detect_hazards(&records, &HazardThresholds::default()),
            vec!["Rapid wave height increase".to_string()]
        );
    }

    #[test]
    fn test_precipitation_and_cape() {
        let mut records = series(2);
        records[0].precip_rate = Some(3e-4);
        records[1].cape = Some(1500.0);

        assert_eq!(
            detect_hazards(&records, &HazardThresholds::default()),
            vec![
                "Heavy precipitation potential".to_string(),
                "Convective instability (CAPE > 1000)".to_string(),
            ]
        );
    }

    #[test]
    fn test_rules_keep_fixed_order() {
        let mut records = with_wind(&[20.0, 28.0]);
        records[0].cape = Some(2000.0);
        records[1].gust_kt = Some(40.0);
        records[0].sig_wave_height_m = Some(1.0);
        records[1].sig_wave_height_m = Some(2.0);

        assert_eq!(
            detect_hazards(&records, &HazardThresholds::default()),
            vec![
                "Strong winds >25 kt expected".to_string(),
                "Elevated gust factor > 1.25 (squally)".to_string(),
                "Rapid wave height increase".to_string(),
                "Convective instability (CAPE > 1000)".to_string(),
            ]
        );
    }

    #[test]
    fn test_caution_band() {
        let thresholds = HazardThresholds::default();

        let mut records = with_wind(&[18.0]);
        assert_eq!(risk_assessment(&records, &thresholds), RiskLevel::Caution);

        records[0].gust_kt = Some(36.0);
        assert_eq!(risk_assessment(&records, &thresholds), RiskLevel::NoGo);

        let mut records = with_wind(&[5.0]);
        records[0].sig_wave_height_m = Some(1.5);
        assert_eq!(risk_assessment(&records, &thresholds), RiskLevel::Caution);

        records[0].sig_wave_height_m = Some(2.5);
        assert_eq!(risk_assessment(&records, &thresholds), RiskLevel::NoGo);
    }

    #[test]
    fn test_missing_variables_count_as_zero() {
        let records = series(3);
        let thresholds = HazardThresholds::default();
        assert!(detect_hazards(&records, &thresholds).is_empty());
        assert_eq!(risk_assessment(&records, &thresholds), RiskLevel::Go);
        assert_eq!(summarize_series(&records), SeriesSummary::default());
    }

    #[test]
    fn test_empty_series_has_no_data() {
        assert_eq!(
            risk_assessment(&[], &HazardThresholds::default()),
            RiskLevel::NoData
        );
        assert!(detect_hazards(&[], &HazardThresholds::default()).is_empty());
    }

    #[test]
    fn test_risk_labels() {
        assert_eq!(RiskLevel::NoGo.to_string(), "No-Go");
        assert_eq!(serde_json::to_string(&RiskLevel::NoData).unwrap(), r#""No data""#);
        assert_eq!(serde_json::to_string(&RiskLevel::Go).unwrap(), r#""Go""#);
    }
}
