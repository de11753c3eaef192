//! Configuration management for passage.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use chrono::FixedOffset;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compare::ComparisonThresholds;
use crate::error::{PassageError, Result};
use crate::hazards::HazardThresholds;
use crate::pipeline::{PipelineSettings, PRIMARY_MODEL, SECONDARY_MODEL};
use crate::provider::{DatasetProvider, FileProvider, StaticProvider};
use crate::routes::RouteCatalog;
use crate::sampling::HourSelection;
use crate::timeline::parse_reference_offset;

/// Command-line arguments for passage
#[derive(Parser, Debug, Default)]
#[command(name = "passage")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Route id to forecast
    #[arg(short, long, env = "PASSAGE_ROUTE")]
    pub route: Option<String>,

    /// Departure time, RFC 3339 or naive UTC (defaults to now)
    #[arg(short, long, env = "PASSAGE_DEPARTURE")]
    pub departure: Option<String>,

    /// Vessel speed in knots
    #[arg(short, long, env = "PASSAGE_SPEED")]
    pub speed: Option<f64>,

    /// Track time step in hours
    #[arg(long, env = "PASSAGE_STEP_HOURS")]
    pub step_hours: Option<f64>,

    /// Reference UTC offset for local timestamps (UTC, -05:00, +0930)
    #[arg(long = "tz", env = "PASSAGE_TZ")]
    pub reference_offset: Option<String>,

    /// Forecast-hour matching (hour_of_day, lead_time)
    #[arg(long, env = "PASSAGE_HOUR_SELECTION")]
    pub hour_selection: Option<String>,

    /// GFS grid file (.json, .nc)
    #[arg(long, env = "PASSAGE_GFS_DATASET")]
    pub gfs_dataset: Option<PathBuf>,

    /// ECMWF grid file (.json, .nc)
    #[arg(long, env = "PASSAGE_ECMWF_DATASET")]
    pub ecmwf_dataset: Option<PathBuf>,

    /// Extra routes as a JSON array
    #[arg(long, env = "PASSAGE_ROUTES_FILE")]
    pub routes_file: Option<PathBuf>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "PASSAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PASSAGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Print the route catalog and exit
    #[arg(long)]
    pub list_routes: bool,
}

/// What the invocation asked for, beyond configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub route: String,
    pub departure: Option<String>,
    pub list_routes: bool,
}

/// Voyage defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_route")]
    pub default_route: String,

    /// Knots
    #[serde(default = "default_vessel_speed")]
    pub vessel_speed: f64,

    #[serde(default = "default_step_hours")]
    pub step_hours: f64,

    /// Offset for local timestamps; there is no host-local fallback
    #[serde(default)]
    pub reference_offset: Option<String>,

    #[serde(default)]
    pub hour_selection: HourSelection,
}

/// One forecast model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Forecast hours to keep; `None` uses the model's default axis
    #[serde(default)]
    pub hours: Option<Vec<i32>>,

    #[serde(default)]
    pub dataset: Option<PathBuf>,
}

/// The models a run may use
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub gfs: ModelConfig,

    #[serde(default)]
    pub ecmwf: ModelConfig,
}

impl ModelsConfig {
    /// Name, settings and effective forecast hours of every model
    pub fn resolved(&self) -> Vec<(&'static str, &ModelConfig, Vec<i32>)> {
        vec![
            (
                PRIMARY_MODEL,
                &self.gfs,
                self.gfs.hours.clone().unwrap_or_else(default_gfs_hours),
            ),
            (
                SECONDARY_MODEL,
                &self.ecmwf,
                self.ecmwf.hours.clone().unwrap_or_else(default_ecmwf_hours),
            ),
        ]
    }
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub forecast: ForecastConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub thresholds: HazardThresholds,

    #[serde(default)]
    pub comparison: ComparisonThresholds,

    /// Routes added on top of the built-in catalog
    #[serde(default)]
    pub routes_file: Option<PathBuf>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<(Self, RunRequest)> {
        Self::from_args(Args::parse())
    }

    /// Layer parsed arguments over the config file and defaults
    pub fn from_args(args: Args) -> Result<(Self, RunRequest)> {
        let mut config = match &args.config {
            Some(path) => Self::load_from_file(path)?,
            None => Config::default(),
        };

        if let Some(speed) = args.speed {
            config.forecast.vessel_speed = speed;
        }
        if let Some(step_hours) = args.step_hours {
            config.forecast.step_hours = step_hours;
        }
        if args.reference_offset.is_some() {
            config.forecast.reference_offset = args.reference_offset;
        }
        if let Some(selection) = &args.hour_selection {
            config.forecast.hour_selection = selection.parse()?;
        }
        if args.gfs_dataset.is_some() {
            config.models.gfs.dataset = args.gfs_dataset;
        }
        if args.ecmwf_dataset.is_some() {
            config.models.ecmwf.dataset = args.ecmwf_dataset;
        }
        if args.routes_file.is_some() {
            config.routes_file = args.routes_file;
        }
        if let Some(level) = args.log_level {
            config.log_level = level;
        }

        let request = RunRequest {
            route: args
                .route
                .unwrap_or_else(|| config.forecast.default_route.clone()),
            departure: args.departure,
            list_routes: args.list_routes,
        };

        Ok((config, request))
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// The parsed reference offset
    pub fn reference_offset(&self) -> Result<FixedOffset> {
        let text = self
            .forecast
            .reference_offset
            .as_deref()
            .ok_or_else(|| PassageError::Config {
                message: "A reference UTC offset is required (e.g. --tz -06:00 or --tz UTC)"
                    .to_string(),
            })?;
        parse_reference_offset(text).map_err(|e| PassageError::Config {
            message: e.to_string(),
        })
    }

    /// Settings for a [`crate::ForecastPipeline`]
    pub fn pipeline_settings(&self) -> Result<PipelineSettings> {
        Ok(PipelineSettings {
            step_hours: self.forecast.step_hours,
            hour_selection: self.forecast.hour_selection,
            reference_offset: self.reference_offset()?,
            hazard_thresholds: self.thresholds.clone(),
            comparison_thresholds: self.comparison.clone(),
        })
    }

    /// One provider per enabled model, in model order.
    ///
    /// A model without a dataset path is still listed so the run records it
    /// as skipped.
    pub fn providers(&self) -> Vec<Arc<dyn DatasetProvider>> {
        self.models
            .resolved()
            .into_iter()
            .filter(|(_, model, _)| model.enabled)
            .map(|(name, model, hours)| -> Arc<dyn DatasetProvider> {
                match &model.dataset {
                    Some(path) => Arc::new(FileProvider::new(name, path.clone(), hours)),
                    None => Arc::new(StaticProvider::unavailable(name)),
                }
            })
            .collect()
    }

    /// Built-in routes plus any from `routes_file`
    pub fn catalog(&self) -> Result<RouteCatalog> {
        let mut catalog = RouteCatalog::with_defaults();
        if let Some(path) = &self.routes_file {
            catalog.load_file(path)?;
        }
        Ok(catalog)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(PassageError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        if !(self.forecast.vessel_speed.is_finite() && self.forecast.vessel_speed > 0.0) {
            return Err(PassageError::Config {
                message: format!(
                    "Vessel speed must be positive, got {}",
                    self.forecast.vessel_speed
                ),
            });
        }

        if !(self.forecast.step_hours.is_finite() && self.forecast.step_hours > 0.0) {
            return Err(PassageError::Config {
                message: format!(
                    "Step hours must be positive, got {}",
                    self.forecast.step_hours
                ),
            });
        }

        self.reference_offset()?;

        for (name, model, hours) in self.models.resolved() {
            if model.enabled && hours.is_empty() {
                return Err(PassageError::Config {
                    message: format!("Model {} is enabled but has no forecast hours", name),
                });
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forecast: ForecastConfig::default(),
            models: ModelsConfig::default(),
            thresholds: HazardThresholds::default(),
            comparison: ComparisonThresholds::default(),
            routes_file: None,
            log_level: default_log_level(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_route: default_route(),
            vessel_speed: default_vessel_speed(),
            step_hours: default_step_hours(),
            reference_offset: None,
            hour_selection: HourSelection::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            hours: None,
            dataset: None,
        }
    }
}

// Default value functions for serde
fn default_route() -> String {
    "lakecharles-kemah".to_string()
}

fn default_vessel_speed() -> f64 {
    6.0
}

fn default_step_hours() -> f64 {
    crate::track::DEFAULT_STEP_HOURS
}

fn default_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 3-hourly to day one, then 6-hourly
fn default_gfs_hours() -> Vec<i32> {
    (0..=24).step_by(3).chain((30..=72).step_by(6)).collect()
}

fn default_ecmwf_hours() -> Vec<i32> {
    (0..=24).step_by(3).chain((30..=60).step_by(6)).collect()
}
