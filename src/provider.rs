//! Dataset providers.
//!
//! A provider hands the pipeline one model's grid, already decoded, with
//! derived wind speed/direction and restricted to the configured hours.
//! Retrieval and decoding failures surface as `DatasetUnavailable`.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::data_loader;
use crate::error::{PassageError, Result};
use crate::grid::ForecastGrid;

/// Source of a forecast grid for one model
pub trait DatasetProvider: Send + Sync {
    /// Model name, e.g. `gfs`
    fn model(&self) -> &str;

    /// Produce a usable grid or fail with `DatasetUnavailable`
    fn fetch(&self) -> Result<ForecastGrid>;
}

/// Finish a freshly decoded grid the way every provider must
pub fn prepare_grid(mut grid: ForecastGrid, model: &str, hours: &[i32]) -> Result<ForecastGrid> {
    grid.model = model.to_string();
    grid.derive_wind();
    grid.retain_hours(hours);
    if grid.is_empty() {
        return Err(PassageError::dataset_unavailable(
            model,
            "grid has no usable forecast hours or variables",
        ));
    }
    Ok(grid)
}

/// Provider backed by a grid file on disk
#[derive(Debug, Clone)]
pub struct FileProvider {
    model: String,
    path: PathBuf,
    hours: Vec<i32>,
}

impl FileProvider {
    /// `hours` restricts the forecast-hour axis; empty keeps every hour
    pub fn new(model: impl Into<String>, path: impl Into<PathBuf>, hours: Vec<i32>) -> Self {
        Self {
            model: model.into(),
            path: path.into(),
            hours,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<ForecastGrid> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => data_loader::load_json_grid(&self.path, &self.model),
            #[cfg(feature = "netcdf")]
            "nc" | "nc4" | "netcdf" => data_loader::load_netcdf_grid(&self.path, &self.model),
            _ => Err(PassageError::dataset_unavailable(
                &self.model,
                format!("Unsupported dataset format: {}", self.path.display()),
            )),
        }
    }
}

impl DatasetProvider for FileProvider {
    fn model(&self) -> &str {
        &self.model
    }

    fn fetch(&self) -> Result<ForecastGrid> {
        debug!(model = %self.model, path = %self.path.display(), "Loading dataset");
        let grid = self.load().map_err(|e| match e {
            PassageError::DatasetUnavailable { .. } => e,
            other => PassageError::dataset_unavailable(&self.model, other.to_string()),
        })?;
        prepare_grid(grid, &self.model, &self.hours)
    }
}

/// Provider serving a grid that is already in memory
#[derive(Debug, Clone)]
pub struct StaticProvider {
    model: String,
    grid: Option<ForecastGrid>,
}

impl StaticProvider {
    pub fn new(model: impl Into<String>, grid: ForecastGrid) -> Self {
        Self {
            model: model.into(),
            grid: Some(grid),
        }
    }

    /// A provider that always reports its dataset as unavailable
    pub fn unavailable(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            grid: None,
        }
    }
}

impl DatasetProvider for StaticProvider {
    fn model(&self) -> &str {
        &self.model
    }

    fn fetch(&self) -> Result<ForecastGrid> {
        let grid = self
            .grid
            .clone()
            .ok_or_else(|| PassageError::dataset_unavailable(&self.model, "no dataset fetched"))?;
        prepare_grid(grid, &self.model, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::{save_json_grid, GridDocument, WindUnits};
    use crate::grid::GridVariable;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn document() -> GridDocument {
        let mut variables = BTreeMap::new();
        variables.insert("u10".to_string(), vec![Some(3.0); 3]);
        variables.insert("v10".to_string(), vec![Some(4.0); 3]);
        GridDocument {
            model: Some("other".to_string()),
            cycle: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            latitudes: vec![29.0],
            longitudes: vec![-94.0],
            forecast_hours: vec![0, 3, 6],
            wind_units: WindUnits::Knots,
            variables,
        }
    }

    #[test]
    fn test_file_provider_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gfs.json");
        save_json_grid(&path, &document()).unwrap();

        let provider = FileProvider::new("gfs", &path, vec![0, 6]);
        let grid = provider.fetch().unwrap();

        assert_eq!(grid.model, "gfs");
        assert_eq!(grid.forecast_hours(), &[0, 6]);
        let speed = grid.field(GridVariable::WindSpeed).unwrap();
        assert!((speed[[1, 0, 0]] - 5.0).abs() < 1e-6);
        assert!(grid.has_field(GridVariable::WindDir));
    }

    #[test]
    fn test_file_provider_failures_are_unavailable() {
        let dir = tempdir().unwrap();

        let missing = FileProvider::new("gfs", dir.path().join("missing.json"), vec![]);
        assert!(matches!(
            missing.fetch(),
            Err(PassageError::DatasetUnavailable { ref model, .. }) if model == "gfs"
        ));

        let garbage = dir.path().join("broken.json");
        std::fs::write(&garbage, "{ not json").unwrap();
        let broken = FileProvider::new("ecmwf", &garbage, vec![]);
        assert!(matches!(
            broken.fetch(),
            Err(PassageError::DatasetUnavailable { .. })
        ));

        let unknown = FileProvider::new("gfs", dir.path().join("grid.grib2"), vec![]);
        assert!(matches!(
            unknown.fetch(),
            Err(PassageError::DatasetUnavailable { .. })
        ));
    }

    #[test]
    fn test_hours_filter_can_empty_the_grid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gfs.json");
        save_json_grid(&path, &document()).unwrap();

        let provider = FileProvider::new("gfs", &path, vec![48]);
        assert!(matches!(
            provider.fetch(),
            Err(PassageError::DatasetUnavailable { .. })
        ));
    }

    #[test]
    fn test_static_provider() {
        let grid = document().into_grid("gfs").unwrap();
        let provider = StaticProvider::new("gfs", grid);
        assert_eq!(provider.model(), "gfs");
        assert!(provider.fetch().unwrap().has_field(GridVariable::WindSpeed));

        let provider = StaticProvider::unavailable("ecmwf");
        assert!(provider.fetch().is_err());
    }
}
