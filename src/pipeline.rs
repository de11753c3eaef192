//! Forecast orchestration.
//!
//! One run builds the track once, then for each provider fetches a grid,
//! samples it, and classifies the result. A failing provider is recorded as
//! skipped and never aborts the run. When both GFS and ECMWF succeed their
//! series are compared.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::compare::{compare_models, ComparisonThresholds};
use crate::error::{PassageError, Result};
use crate::grid::ForecastGrid;
use crate::hazards::{
    detect_hazards, risk_assessment, summarize_series, HazardThresholds, RiskLevel, SeriesSummary,
};
use crate::logging::{log_error, log_model_skip, log_operation_end, log_operation_start};
use crate::provider::DatasetProvider;
use crate::routes::{Route, RouteCatalog};
use crate::sampling::{FieldSampler, HourSelection, SampleRecord};
use crate::timeline::{annotate_timeline, TimelineEntry};
use crate::track::{generate_track, TrackPoint, DEFAULT_STEP_HOURS};

/// Models whose series are cross-checked when both are present
pub const PRIMARY_MODEL: &str = "gfs";
pub const SECONDARY_MODEL: &str = "ecmwf";

/// Knobs for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub step_hours: f64,
    pub hour_selection: HourSelection,
    /// Offset used for the `time_local` annotation
    pub reference_offset: FixedOffset,
    pub hazard_thresholds: HazardThresholds,
    pub comparison_thresholds: ComparisonThresholds,
}

impl PipelineSettings {
    /// Default settings; the reference offset has no default
    pub fn new(reference_offset: FixedOffset) -> Self {
        Self {
            step_hours: DEFAULT_STEP_HOURS,
            hour_selection: HourSelection::default(),
            reference_offset,
            hazard_thresholds: HazardThresholds::default(),
            comparison_thresholds: ComparisonThresholds::default(),
        }
    }
}

/// Result for one model
#[derive(Debug, Clone, Serialize)]
pub struct ModelForecast {
    pub route: String,
    pub model: String,
    pub departure: DateTime<Utc>,
    pub cycle: DateTime<Utc>,
    pub track: Vec<TimelineEntry>,
    pub hazards: Vec<String>,
    pub risk: RiskLevel,
    pub summary: SeriesSummary,
}

/// A model that produced no result, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSkip {
    pub model: String,
    pub reason: String,
}

/// Cross-model divergence notes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub models: Vec<String>,
    pub notes: Vec<String>,
}

/// Everything a run produced, ready for a report renderer
#[derive(Debug, Clone, Serialize)]
pub struct ForecastRun {
    pub route_id: String,
    pub route_name: String,
    pub departure: DateTime<Utc>,
    pub models: BTreeMap<String, ModelForecast>,
    pub skipped: Vec<ModelSkip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonReport>,
}

/// Runs the track → sample → hazards → comparison chain
#[derive(Debug, Clone)]
pub struct ForecastPipeline<'a> {
    catalog: &'a RouteCatalog,
    settings: PipelineSettings,
    sampler: FieldSampler,
}

impl<'a> ForecastPipeline<'a> {
    pub fn new(catalog: &'a RouteCatalog, settings: PipelineSettings) -> Self {
        let sampler = FieldSampler::new(settings.hour_selection);
        Self {
            catalog,
            settings,
            sampler,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run with providers fetched one after another
    pub fn run(
        &self,
        route_id: &str,
        departure: DateTime<Utc>,
        speed_knots: f64,
        providers: &[Arc<dyn DatasetProvider>],
    ) -> Result<ForecastRun> {
        let start = Instant::now();
        log_operation_start("forecast_run", Some(route_id));

        let (route, track) = self.plan(route_id, departure, speed_knots)?;
        let fetched = providers
            .iter()
            .map(|provider| (provider.model().to_string(), fetch_grid(provider.as_ref())))
            .collect();

        let run = self.assemble(route, departure, &track, fetched);
        log_operation_end("forecast_run", start, run.skipped.is_empty());
        Ok(run)
    }

    /// Run with every provider fetched concurrently on the blocking pool.
    ///
    /// Results are merged in provider order once all fetches finish.
    pub async fn run_concurrent(
        &self,
        route_id: &str,
        departure: DateTime<Utc>,
        speed_knots: f64,
        providers: &[Arc<dyn DatasetProvider>],
    ) -> Result<ForecastRun> {
        let start = Instant::now();
        log_operation_start("forecast_run", Some(route_id));

        let (route, track) = self.plan(route_id, departure, speed_knots)?;
        let tasks = providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            tokio::task::spawn_blocking(move || fetch_grid(provider.as_ref()))
        });
        let joined = futures::future::join_all(tasks).await;

        let fetched = providers
            .iter()
            .zip(joined)
            .map(|(provider, outcome)| {
                let model = provider.model().to_string();
                let grid = outcome.unwrap_or_else(|e| {
                    Err(PassageError::dataset_unavailable(
                        &model,
                        format!("fetch task failed: {}", e),
                    ))
                });
                (model, grid)
            })
            .collect();

        let run = self.assemble(route, departure, &track, fetched);
        log_operation_end("forecast_run", start, run.skipped.is_empty());
        Ok(run)
    }

    /// Resolve the route and build its track; fails before any fetch
    fn plan(
        &self,
        route_id: &str,
        departure: DateTime<Utc>,
        speed_knots: f64,
    ) -> Result<(&'a Route, Vec<TrackPoint>)> {
        let route = self.catalog.lookup(route_id)?;
        let track = generate_track(route, departure, speed_knots, self.settings.step_hours)?;
        info!(
            route_id = route_id,
            points = track.len(),
            speed_knots = speed_knots,
            "Track generated"
        );
        Ok((route, track))
    }

    fn assemble(
        &self,
        route: &Route,
        departure: DateTime<Utc>,
        track: &[TrackPoint],
        fetched: Vec<(String, Result<ForecastGrid>)>,
    ) -> ForecastRun {
        let mut models = BTreeMap::new();
        let mut series: HashMap<String, Vec<SampleRecord>> = HashMap::new();
        let mut skipped = Vec::new();
        let mut seen = HashSet::new();

        for (model, grid) in fetched {
            // First provider for a model name wins
            if !seen.insert(model.clone()) {
                let reason = "duplicate provider for model".to_string();
                log_model_skip(&model, &reason);
                skipped.push(ModelSkip { model, reason });
                continue;
            }

            let grid = match grid {
                Ok(grid) => grid,
                Err(e) => {
                    log_error(&e, "dataset fetch");
                    skipped.push(ModelSkip {
                        model,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let samples = self.sampler.sample(&grid, track);
            if samples.is_empty() {
                let reason = "no samples along the track".to_string();
                log_model_skip(&model, &reason);
                skipped.push(ModelSkip { model, reason });
                continue;
            }

            let forecast = self.build_forecast(route, &model, departure, &grid, &samples);
            info!(
                model = %model,
                risk = %forecast.risk,
                hazards = forecast.hazards.len(),
                "Model forecast ready"
            );
            series.insert(model.clone(), samples);
            models.insert(model, forecast);
        }

        let comparison = match (series.get(PRIMARY_MODEL), series.get(SECONDARY_MODEL)) {
            (Some(primary), Some(secondary)) => Some(ComparisonReport {
                models: vec![PRIMARY_MODEL.to_string(), SECONDARY_MODEL.to_string()],
                notes: compare_models(primary, secondary, &self.settings.comparison_thresholds),
            }),
            _ => None,
        };

        ForecastRun {
            route_id: route.id.clone(),
            route_name: route.name.clone(),
            departure,
            models,
            skipped,
            comparison,
        }
    }

    fn build_forecast(
        &self,
        route: &Route,
        model: &str,
        departure: DateTime<Utc>,
        grid: &ForecastGrid,
        samples: &[SampleRecord],
    ) -> ModelForecast {
        let thresholds = &self.settings.hazard_thresholds;
        ModelForecast {
            route: route.id.clone(),
            model: model.to_string(),
            departure,
            cycle: grid.cycle,
            track: annotate_timeline(samples, self.settings.reference_offset),
            hazards: detect_hazards(samples, thresholds),
            risk: risk_assessment(samples, thresholds),
            summary: summarize_series(samples),
        }
    }
}

fn fetch_grid(provider: &dyn DatasetProvider) -> Result<ForecastGrid> {
    let grid = provider.fetch()?;
    info!(
        model = provider.model(),
        cycle = %grid.cycle,
        forecast_hours = grid.forecast_hours().len(),
        "Dataset fetched"
    );
    Ok(grid)
}
