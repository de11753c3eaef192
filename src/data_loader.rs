//! Forecast grid loading.
//!
//! Two on-disk layouts are understood: a JSON grid document and, with the
//! `netcdf` feature, a NetCDF file with `fhour`, `lat`/`latitude` and
//! `lon`/`longitude` coordinates. Both end up as a [`ForecastGrid`] with wind
//! speeds in knots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::grid::{ForecastGrid, GridVariable};

/// Knots per metre per second
pub const MS_TO_KNOTS: f32 = 1.943_844;

/// Unit of the wind-speed-like fields in a grid document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindUnits {
    #[default]
    Knots,
    MetersPerSecond,
}

/// JSON representation of a forecast grid.
///
/// Each variable is a flat `[fhour][lat][lon]` array; `null` marks missing
/// cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDocument {
    #[serde(default)]
    pub model: Option<String>,
    pub cycle: DateTime<Utc>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    pub forecast_hours: Vec<i32>,
    #[serde(default)]
    pub wind_units: WindUnits,
    pub variables: BTreeMap<String, Vec<Option<f32>>>,
}

impl GridDocument {
    /// Build a grid, skipping variables with unknown names
    pub fn into_grid(self, model: &str) -> Result<ForecastGrid> {
        let mut grid = ForecastGrid::new(
            self.model.unwrap_or_else(|| model.to_string()),
            self.cycle,
            self.latitudes,
            self.longitudes,
            self.forecast_hours,
        );

        for (name, values) in self.variables {
            let variable = match name.parse::<GridVariable>() {
                Ok(variable) => variable,
                Err(_) => {
                    warn!(model = model, variable = %name, "Skipping unsupported variable");
                    continue;
                }
            };
            let values: Vec<f32> = values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect();
            grid.insert_flat(variable, values)?;
        }

        if self.wind_units == WindUnits::MetersPerSecond {
            grid.scale_wind_fields(MS_TO_KNOTS);
        }
        Ok(grid)
    }
}

/// Load a JSON grid document
pub fn load_json_grid(path: &Path, model: &str) -> Result<ForecastGrid> {
    let content = std::fs::read_to_string(path)?;
    let document: GridDocument = serde_json::from_str(&content)?;
    let grid = document.into_grid(model)?;
    log_grid_stats(path, &grid);
    Ok(grid)
}

/// Write a grid document as JSON
pub fn save_json_grid(path: &Path, document: &GridDocument) -> Result<()> {
    let content = serde_json::to_string(document)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn log_grid_stats(path: &Path, grid: &ForecastGrid) {
    let (hours, lats, lons) = grid.shape();
    let names: Vec<&str> = grid.variables().iter().map(|v| v.name()).collect();
    info!(
        operation = "grid_load",
        file_path = %path.display(),
        model = %grid.model,
        cycle = %grid.cycle,
        forecast_hours = hours,
        lat_count = lats,
        lon_count = lons,
        vars = %names.join(", "),
        "Grid loaded"
    );
}

/// Whether a `units` attribute denotes metres per second
#[cfg_attr(not(feature = "netcdf"), allow(dead_code))]
fn is_meters_per_second(units: &str) -> bool {
    matches!(
        units.trim().to_lowercase().as_str(),
        "m s**-1" | "m s-1" | "m/s" | "m.s-1" | "meters per second"
    )
}

#[cfg(feature = "netcdf")]
pub use self::netcdf_grid::load_netcdf_grid;

#[cfg(feature = "netcdf")]
mod netcdf_grid {
    use super::*;
    use crate::error::PassageError;
    use netcdf::{AttributeValue, Variable as NetCDFVariable};
    use tracing::debug;

    const HOUR_NAMES: [&str; 2] = ["fhour", "step"];
    const LAT_NAMES: [&str; 2] = ["latitude", "lat"];
    const LON_NAMES: [&str; 2] = ["longitude", "lon"];

    /// Load a NetCDF forecast file.
    ///
    /// Variables must be laid out `[fhour, lat, lon]`; others are skipped.
    /// The cycle comes from the global `cycle` attribute (RFC 3339).
    pub fn load_netcdf_grid(path: &Path, model: &str) -> Result<ForecastGrid> {
        if !path.exists() {
            return Err(PassageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )));
        }

        let file = netcdf::open(path)?;
        debug!("Opened NetCDF file: {}", path.display());

        let hour_name = find_coordinate(&file, &HOUR_NAMES)?;
        let lat_name = find_coordinate(&file, &LAT_NAMES)?;
        let lon_name = find_coordinate(&file, &LON_NAMES)?;

        let hours: Vec<i32> = coordinate(&file, &hour_name)?.get_values::<i32, _>(..)?;
        let latitudes: Vec<f64> = coordinate(&file, &lat_name)?.get_values::<f64, _>(..)?;
        let longitudes: Vec<f64> = coordinate(&file, &lon_name)?.get_values::<f64, _>(..)?;
        let cycle = read_cycle(&file)?;

        let mut grid = ForecastGrid::new(model, cycle, latitudes, longitudes, hours);
        let expected_dims = [hour_name.as_str(), lat_name.as_str(), lon_name.as_str()];

        for var in file.variables() {
            let name = var.name();
            let Ok(variable) = name.parse::<GridVariable>() else {
                continue;
            };
            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            if dims != expected_dims {
                warn!(
                    variable = %name,
                    dims = ?dims,
                    "Skipping variable with unexpected dimensions"
                );
                continue;
            }

            let mut values: Vec<f32> = var.get_values::<f32, _>(..)?;
            apply_fill_value(&var, &mut values);
            if variable.is_wind_speed() && variable_units(&var).is_some_and(|u| is_meters_per_second(&u)) {
                values.iter_mut().for_each(|v| *v *= MS_TO_KNOTS);
            }
            grid.insert_flat(variable, values)?;
        }

        log_grid_stats(path, &grid);
        Ok(grid)
    }

    fn find_coordinate(file: &netcdf::File, candidates: &[&str]) -> Result<String> {
        candidates
            .iter()
            .find(|name| file.variable(name).is_some())
            .map(|name| name.to_string())
            .ok_or_else(|| PassageError::Config {
                message: format!("Missing coordinate variable, expected one of {:?}", candidates),
            })
    }

    fn coordinate<'f>(file: &'f netcdf::File, name: &str) -> Result<NetCDFVariable<'f>> {
        file.variable(name).ok_or_else(|| PassageError::Config {
            message: format!("Coordinate not found: {}", name),
        })
    }

    fn read_cycle(file: &netcdf::File) -> Result<DateTime<Utc>> {
        let attr = file.attribute("cycle").ok_or_else(|| PassageError::Config {
            message: "Missing global attribute: cycle".to_string(),
        })?;
        match attr.value()? {
            AttributeValue::Str(text) => DateTime::parse_from_rfc3339(&text)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| PassageError::Config {
                    message: format!("Invalid cycle attribute {:?}: {}", text, e),
                }),
            other => Err(PassageError::Config {
                message: format!("Cycle attribute must be a string, got {:?}", other),
            }),
        }
    }

    fn variable_units(var: &NetCDFVariable) -> Option<String> {
        match var.attribute("units")?.value().ok()? {
            AttributeValue::Str(units) => Some(units),
            _ => None,
        }
    }

    /// Replace `_FillValue` cells with NaN
    fn apply_fill_value(var: &NetCDFVariable, values: &mut [f32]) {
        let fill = match var.attribute("_FillValue").and_then(|a| a.value().ok()) {
            Some(AttributeValue::Float(v)) => v,
            Some(AttributeValue::Double(v)) => v as f32,
            _ => return,
        };
        for value in values.iter_mut() {
            if *value == fill {
                *value = f32::NAN;
            }
        }
    }
}
