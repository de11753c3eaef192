//! Test data generation utilities.
//!
//! Forecast grids over the upper Texas and Louisiana coast, written as JSON
//! grid documents or NetCDF files with known, uniform values.

use chrono::{DateTime, TimeZone, Utc};
use passage::data_loader::{save_json_grid, GridDocument, WindUnits};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Grid latitudes, south to north
pub const LATITUDES: [f64; 4] = [29.0, 29.5, 30.0, 30.5];

/// Grid longitudes, west to east (degrees east, negative)
pub const LONGITUDES: [f64; 6] = [-95.5, -95.0, -94.5, -94.0, -93.5, -93.0];

/// Model initialization time shared by every generated grid
pub fn cycle() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// 3-hourly forecast hours out to 72
pub fn forecast_hours() -> Vec<i32> {
    (0..=72).step_by(3).collect()
}

fn cell_count() -> usize {
    forecast_hours().len() * LATITUDES.len() * LONGITUDES.len()
}

/// A grid document where every cell of each variable holds one value.
///
/// Wind-like values are in knots.
pub fn uniform_document(values: &[(&str, f32)]) -> GridDocument {
    let variables: BTreeMap<String, Vec<Option<f32>>> = values
        .iter()
        .map(|(name, value)| (name.to_string(), vec![Some(*value); cell_count()]))
        .collect();

    GridDocument {
        model: None,
        cycle: cycle(),
        latitudes: LATITUDES.to_vec(),
        longitudes: LONGITUDES.to_vec(),
        forecast_hours: forecast_hours(),
        wind_units: WindUnits::Knots,
        variables,
    }
}

/// Wind from the u/v components giving `speed_kt`, plus uniform waves
pub fn wind_and_waves(speed_kt: f32, swh_m: f32) -> GridDocument {
    // 3-4-5 triangle: wind blowing from the south-west
    uniform_document(&[
        ("u10", speed_kt * 0.6),
        ("v10", speed_kt * 0.8),
        ("swh", swh_m),
    ])
}

/// Write a grid document into `dir` and return its path
pub fn write_json_dataset(dir: &Path, name: &str, document: &GridDocument) -> PathBuf {
    let path = dir.join(format!("{}.json", name));
    save_json_grid(&path, document).unwrap();
    path
}

#[cfg(feature = "netcdf")]
pub use self::nc::create_wind_nc;

#[cfg(feature = "netcdf")]
mod nc {
    use super::*;
    use netcdf::Error;

    type Result<T> = std::result::Result<T, Error>;

    /// Creates a NetCDF grid with uniform wind components in m/s.
    ///
    /// Longitudes are stored 0..360 and the `u10` variable carries a
    /// `_FillValue` at its first cell.
    pub fn create_wind_nc(path: &Path, u_ms: f32, v_ms: f32) -> Result<()> {
        let hours: Vec<i32> = forecast_hours();
        let lat_values: Vec<f64> = LATITUDES.to_vec();
        let lon_values: Vec<f64> = LONGITUDES.iter().map(|lon| lon + 360.0).collect();
        let size = hours.len() * lat_values.len() * lon_values.len();

        let mut file = netcdf::create(path)?;

        file.add_dimension("fhour", hours.len())?;
        file.add_dimension("latitude", lat_values.len())?;
        file.add_dimension("longitude", lon_values.len())?;

        file.add_attribute("title", "Wind test grid")?;
        file.add_attribute("cycle", "2024-01-01T00:00:00Z")?;

        {
            let mut var = file.add_variable::<i32>("fhour", &["fhour"])?;
            var.put_attribute("units", "hours")?;
            var.put_values(&hours, &[..])?;
        }

        {
            let mut var = file.add_variable::<f64>("latitude", &["latitude"])?;
            var.put_attribute("units", "degrees_north")?;
            var.put_values(&lat_values, &[..])?;
        }

        {
            let mut var = file.add_variable::<f64>("longitude", &["longitude"])?;
            var.put_attribute("units", "degrees_east")?;
            var.put_values(&lon_values, &[..])?;
        }

        {
            let mut u_values = vec![u_ms; size];
            u_values[0] = -9999.0;
            let mut var = file.add_variable::<f32>("u10", &["fhour", "latitude", "longitude"])?;
            var.put_attribute("units", "m s**-1")?;
            var.put_attribute("_FillValue", -9999.0f32)?;
            var.put_values(&u_values, &[.., .., ..])?;
        }

        {
            let v_values = vec![v_ms; size];
            let mut var = file.add_variable::<f32>("v10", &["fhour", "latitude", "longitude"])?;
            var.put_attribute("units", "m s**-1")?;
            var.put_values(&v_values, &[.., .., ..])?;
        }

        Ok(())
    }
}
