//! Spatio-temporal sampling of forecast grids onto a track.
//!
//! Every track point picks the nearest forecast hour and then the nearest
//! grid cell at that hour. Values are copied verbatim: no spatial or temporal
//! interpolation, and no derivation of variables the grid does not carry.

pub mod nearest;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PassageError, Result};
use crate::grid::{ForecastGrid, GridVariable};
use crate::track::TrackPoint;

/// How a track point's time is matched against the forecast-hour axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourSelection {
    /// Compare the ETA's UTC hour-of-day with the forecast hours.
    ///
    /// This ignores the date and the model cycle, so a voyage longer than a
    /// day keeps sampling the first day's hours.
    #[default]
    HourOfDay,
    /// Compare hours elapsed since the grid's cycle with the forecast hours
    LeadTime,
}

impl HourSelection {
    /// Target forecast hour for a point in time
    pub fn target_hour(&self, time: DateTime<Utc>, cycle: DateTime<Utc>) -> f64 {
        match self {
            HourSelection::HourOfDay => f64::from(time.hour()),
            HourSelection::LeadTime => (time - cycle).num_seconds() as f64 / 3600.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HourSelection::HourOfDay => "hour_of_day",
            HourSelection::LeadTime => "lead_time",
        }
    }
}

impl fmt::Display for HourSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HourSelection {
    type Err = PassageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "hour_of_day" => Ok(HourSelection::HourOfDay),
            "lead_time" => Ok(HourSelection::LeadTime),
            _ => Err(PassageError::invalid_input(
                "hour_selection",
                format!("Unknown hour selection: {}. Must be one of: hour_of_day, lead_time", s),
            )),
        }
    }
}

/// Weather sampled at one track point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(flatten)]
    pub point: TrackPoint,
    /// Forecast hour the values were read from
    pub source_fhour: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_kt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_dir_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust_kt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mslp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precip_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_wave_height_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_period_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wave_dir_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cape: Option<f64>,
}

impl SampleRecord {
    /// A record with no weather values
    pub fn new(point: TrackPoint, source_fhour: i32) -> Self {
        Self {
            point,
            source_fhour,
            wind_speed_kt: None,
            wind_dir_deg: None,
            gust_kt: None,
            mslp: None,
            precip_rate: None,
            sig_wave_height_m: None,
            wave_period_s: None,
            wave_dir_deg: None,
            cape: None,
        }
    }

    pub fn time_utc(&self) -> DateTime<Utc> {
        self.point.time_utc
    }

    /// Value of a sampled variable; wind components are never stored
    pub fn get(&self, variable: GridVariable) -> Option<f64> {
        match variable {
            GridVariable::WindSpeed => self.wind_speed_kt,
            GridVariable::WindDir => self.wind_dir_deg,
            GridVariable::Gust => self.gust_kt,
            GridVariable::Mslp => self.mslp,
            GridVariable::Prate => self.precip_rate,
            GridVariable::Swh => self.sig_wave_height_m,
            GridVariable::Dwp => self.wave_period_s,
            GridVariable::Mwd => self.wave_dir_deg,
            GridVariable::Cape => self.cape,
            GridVariable::U10 | GridVariable::V10 => None,
        }
    }

    fn slot_mut(&mut self, variable: GridVariable) -> Option<&mut Option<f64>> {
        match variable {
            GridVariable::WindSpeed => Some(&mut self.wind_speed_kt),
            GridVariable::WindDir => Some(&mut self.wind_dir_deg),
            GridVariable::Gust => Some(&mut self.gust_kt),
            GridVariable::Mslp => Some(&mut self.mslp),
            GridVariable::Prate => Some(&mut self.precip_rate),
            GridVariable::Swh => Some(&mut self.sig_wave_height_m),
            GridVariable::Dwp => Some(&mut self.wave_period_s),
            GridVariable::Mwd => Some(&mut self.wave_dir_deg),
            GridVariable::Cape => Some(&mut self.cape),
            GridVariable::U10 | GridVariable::V10 => None,
        }
    }

    /// Set a sampled variable, ignoring wind components
    pub fn set(&mut self, variable: GridVariable, value: f64) {
        if let Some(slot) = self.slot_mut(variable) {
            *slot = Some(value);
        }
    }
}

/// Samples forecast grids at track points
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSampler {
    selection: HourSelection,
}

impl FieldSampler {
    pub fn new(selection: HourSelection) -> Self {
        Self { selection }
    }

    pub fn selection(&self) -> HourSelection {
        self.selection
    }

    /// One record per track point, in track order.
    ///
    /// An empty grid yields an empty vector; callers check for that.
    pub fn sample(&self, grid: &ForecastGrid, points: &[TrackPoint]) -> Vec<SampleRecord> {
        if grid.is_empty() {
            return Vec::new();
        }
        points
            .iter()
            .filter_map(|point| self.sample_point(grid, point))
            .collect()
    }

    fn sample_point(&self, grid: &ForecastGrid, point: &TrackPoint) -> Option<SampleRecord> {
        let target = self.selection.target_hour(point.time_utc, grid.cycle);
        let hour_idx = nearest::nearest_hour_index(grid.forecast_hours(), target)?;
        let lat_idx = nearest::nearest_index(grid.latitudes(), point.lat)?;
        let lon = nearest::wrap_longitude(point.lon, grid.longitudes());
        let lon_idx = nearest::nearest_index(grid.longitudes(), lon)?;

        let mut record = SampleRecord::new(point.clone(), grid.forecast_hours()[hour_idx]);
        for variable in GridVariable::SAMPLED {
            let Some(field) = grid.field(variable) else {
                continue;
            };
            let value = field[[hour_idx, lat_idx, lon_idx]];
            // NaN marks cells outside the model's coverage (e.g. waves over land).
            if value.is_finite() {
                record.set(variable, f64::from(value));
            }
        }
        Some(record)
    }
}
