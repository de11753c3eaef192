//! In-memory forecast grids.
//!
//! A grid holds one model cycle: coordinate axes for latitude, longitude and
//! forecast hour, plus a `[fhour, lat, lon]` array per decoded variable.
//! Providers build grids; the sampler only reads them.

use chrono::{DateTime, Utc};
use ndarray::{Array3, Axis, Zip};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{PassageError, Result};

/// Variables a dataset provider may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridVariable {
    /// Eastward 10 m wind component
    U10,
    /// Northward 10 m wind component
    V10,
    WindSpeed,
    WindDir,
    Gust,
    Mslp,
    /// Precipitation rate
    Prate,
    /// Significant wave height
    Swh,
    /// Dominant wave period
    Dwp,
    /// Mean wave direction
    Mwd,
    Cape,
}

impl GridVariable {
    pub const ALL: [GridVariable; 11] = [
        GridVariable::U10,
        GridVariable::V10,
        GridVariable::WindSpeed,
        GridVariable::WindDir,
        GridVariable::Gust,
        GridVariable::Mslp,
        GridVariable::Prate,
        GridVariable::Swh,
        GridVariable::Dwp,
        GridVariable::Mwd,
        GridVariable::Cape,
    ];

    /// Variables copied onto sample records, in output order
    pub const SAMPLED: [GridVariable; 9] = [
        GridVariable::WindSpeed,
        GridVariable::WindDir,
        GridVariable::Gust,
        GridVariable::Mslp,
        GridVariable::Prate,
        GridVariable::Swh,
        GridVariable::Dwp,
        GridVariable::Mwd,
        GridVariable::Cape,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GridVariable::U10 => "u10",
            GridVariable::V10 => "v10",
            GridVariable::WindSpeed => "wind_speed",
            GridVariable::WindDir => "wind_dir",
            GridVariable::Gust => "gust",
            GridVariable::Mslp => "mslp",
            GridVariable::Prate => "prate",
            GridVariable::Swh => "swh",
            GridVariable::Dwp => "dwp",
            GridVariable::Mwd => "mwd",
            GridVariable::Cape => "cape",
        }
    }

    /// Whether values are wind speeds that providers normalize to knots
    pub fn is_wind_speed(&self) -> bool {
        matches!(
            self,
            GridVariable::U10 | GridVariable::V10 | GridVariable::WindSpeed | GridVariable::Gust
        )
    }
}

impl fmt::Display for GridVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GridVariable {
    type Err = PassageError;

    /// Accepts canonical names and the GRIB short names decoders emit
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "u10" | "10u" => Ok(GridVariable::U10),
            "v10" | "10v" => Ok(GridVariable::V10),
            "wind_speed" => Ok(GridVariable::WindSpeed),
            "wind_dir" => Ok(GridVariable::WindDir),
            "gust" => Ok(GridVariable::Gust),
            "mslp" | "msl" => Ok(GridVariable::Mslp),
            "prate" => Ok(GridVariable::Prate),
            "swh" => Ok(GridVariable::Swh),
            "dwp" | "pp1d" => Ok(GridVariable::Dwp),
            "mwd" => Ok(GridVariable::Mwd),
            "cape" => Ok(GridVariable::Cape),
            _ => Err(PassageError::invalid_input(
                "variable",
                format!("Unknown grid variable: {}", s),
            )),
        }
    }
}

/// Gridded forecast fields for one model cycle
#[derive(Debug, Clone)]
pub struct ForecastGrid {
    /// Model name, e.g. `gfs`
    pub model: String,
    /// Model initialization time
    pub cycle: DateTime<Utc>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    forecast_hours: Vec<i32>,
    fields: HashMap<GridVariable, Array3<f32>>,
}

impl ForecastGrid {
    /// Create a grid with axes and no variables
    pub fn new(
        model: impl Into<String>,
        cycle: DateTime<Utc>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        forecast_hours: Vec<i32>,
    ) -> Self {
        Self {
            model: model.into(),
            cycle,
            latitudes,
            longitudes,
            forecast_hours,
            fields: HashMap::new(),
        }
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn forecast_hours(&self) -> &[i32] {
        &self.forecast_hours
    }

    /// Expected `[fhour, lat, lon]` shape of every field
    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.forecast_hours.len(),
            self.latitudes.len(),
            self.longitudes.len(),
        )
    }

    /// True when the grid cannot answer any point query
    pub fn is_empty(&self) -> bool {
        let (hours, lats, lons) = self.shape();
        hours == 0 || lats == 0 || lons == 0 || self.fields.is_empty()
    }

    /// Add or replace a variable, checking its shape against the axes
    pub fn insert_field(&mut self, variable: GridVariable, data: Array3<f32>) -> Result<()> {
        let (hours, lats, lons) = self.shape();
        if data.dim() != (hours, lats, lons) {
            return Err(PassageError::invalid_input(
                variable.name(),
                format!(
                    "Field shape {:?} does not match grid axes ({}, {}, {})",
                    data.shape(),
                    hours,
                    lats,
                    lons
                ),
            ));
        }
        self.fields.insert(variable, data);
        Ok(())
    }

    /// Add a variable from a flat `[fhour][lat][lon]` vector
    pub fn insert_flat(&mut self, variable: GridVariable, values: Vec<f32>) -> Result<()> {
        let data = Array3::from_shape_vec(self.shape(), values)?;
        self.insert_field(variable, data)
    }

    pub fn field(&self, variable: GridVariable) -> Option<&Array3<f32>> {
        self.fields.get(&variable)
    }

    pub fn has_field(&self, variable: GridVariable) -> bool {
        self.fields.contains_key(&variable)
    }

    /// Variables present in the grid, in a stable order
    pub fn variables(&self) -> Vec<GridVariable> {
        let mut vars: Vec<GridVariable> = self.fields.keys().copied().collect();
        vars.sort();
        vars
    }

    /// Multiply every wind-speed-like field by `factor`
    pub fn scale_wind_fields(&mut self, factor: f32) {
        for (variable, data) in self.fields.iter_mut() {
            if variable.is_wind_speed() {
                data.mapv_inplace(|v| v * factor);
            }
        }
    }

    /// Add `wind_speed` and `wind_dir` computed from `u10`/`v10`.
    ///
    /// Direction follows the meteorological "from" convention, 0-360 with
    /// 0 = north. Does nothing when either component is missing.
    pub fn derive_wind(&mut self) {
        let (Some(u), Some(v)) = (
            self.fields.get(&GridVariable::U10),
            self.fields.get(&GridVariable::V10),
        ) else {
            return;
        };

        let speed = Zip::from(u).and(v).map_collect(|&u, &v| wind_speed(u, v));
        let direction = Zip::from(u).and(v).map_collect(|&u, &v| wind_direction(u, v));

        self.fields.insert(GridVariable::WindSpeed, speed);
        self.fields.insert(GridVariable::WindDir, direction);
    }

    /// Keep only the listed forecast hours, preserving axis order.
    ///
    /// An empty list keeps everything.
    pub fn retain_hours(&mut self, hours: &[i32]) {
        if hours.is_empty() {
            return;
        }
        let keep: Vec<usize> = self
            .forecast_hours
            .iter()
            .enumerate()
            .filter(|(_, h)| hours.contains(*h))
            .map(|(i, _)| i)
            .collect();
        if keep.len() == self.forecast_hours.len() {
            return;
        }

        self.forecast_hours = keep.iter().map(|&i| self.forecast_hours[i]).collect();
        for data in self.fields.values_mut() {
            *data = data.select(Axis(0), &keep);
        }
    }
}

/// Wind speed from eastward/northward components
pub fn wind_speed(u: f32, v: f32) -> f32 {
    (u * u + v * v).sqrt()
}

/// Direction the wind blows from, in degrees clockwise from north
pub fn wind_direction(u: f32, v: f32) -> f32 {
    (270.0 - v.atan2(u).to_degrees()).rem_euclid(360.0)
}
