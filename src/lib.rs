//! # passage
//!
//! Weather-aware voyage forecasts for short coastal passages.
//!
//! Given a named route, a departure time and a vessel speed, the crate builds
//! a time-stamped great-circle track, samples gridded forecast-model fields at
//! every track point, flags hazards, classifies the passage as Go, Caution or
//! No-Go, and cross-checks GFS against ECMWF when both are available.
//!
//! ## Architecture
//!
//! - **Routes**: a read-only catalog of named routes ([`routes`])
//! - **Track**: haversine legs split into time steps with slerp positions ([`track`])
//! - **Data**: forecast grids from JSON or NetCDF files behind a provider trait
//!   ([`grid`], [`data_loader`], [`provider`])
//! - **Analysis**: nearest-neighbour sampling, hazard rules, risk levels and
//!   model comparison ([`sampling`], [`hazards`], [`compare`])
//! - **Orchestration**: one run per route and departure across every model
//!   ([`pipeline`])
//!
//! ```no_run
//! use std::sync::Arc;
//! use passage::{DatasetProvider, FileProvider, ForecastPipeline, PipelineSettings, RouteCatalog};
//!
//! # fn main() -> passage::Result<()> {
//! let catalog = RouteCatalog::with_defaults();
//! let settings = PipelineSettings::new(passage::parse_reference_offset("-06:00")?);
//! let pipeline = ForecastPipeline::new(&catalog, settings);
//! let providers: Vec<Arc<dyn DatasetProvider>> =
//!     vec![Arc::new(FileProvider::new("gfs", "gfs.json", vec![]))];
//!
//! let departure = passage::parse_departure("2024-01-01T12:00:00Z")?;
//! let run = pipeline.run("lakecharles-kemah", departure, 6.0, &providers)?;
//! println!("{}", serde_json::to_string_pretty(&run)?);
//! # Ok(())
//! # }
//! ```

pub mod compare;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod grid;
pub mod hazards;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod routes;
pub mod sampling;
pub mod timeline;
pub mod track;

pub use compare::{compare_models, ComparisonThresholds};
pub use config::Config;
pub use error::{PassageError, Result};
pub use grid::{ForecastGrid, GridVariable};
pub use hazards::{
    detect_hazards, risk_assessment, summarize_series, HazardThresholds, RiskLevel, SeriesSummary,
};
pub use logging::{
    generate_run_id, init_tracing, log_error, log_operation_end, log_operation_start,
    log_timed_operation,
};
pub use pipeline::{ForecastPipeline, ForecastRun, ModelForecast, ModelSkip, PipelineSettings};
pub use provider::{DatasetProvider, FileProvider, StaticProvider};
pub use routes::{Route, RouteCatalog, Waypoint};
pub use sampling::{FieldSampler, HourSelection, SampleRecord};
pub use timeline::{annotate_timeline, parse_departure, parse_reference_offset, TimelineEntry};
pub use track::{generate_track, haversine_distance_nm, TrackPoint};
