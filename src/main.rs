//! passage - weather-aware voyage forecasts
//!
//! Command-line entry point: resolves configuration, runs every enabled model
//! and prints the forecast as JSON on stdout.

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use passage::{init_tracing, log_error, log_timed_operation, Config, ForecastPipeline, Route};

#[derive(Serialize)]
struct RouteListing<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    waypoints: usize,
}

impl<'a> From<&'a Route> for RouteListing<'a> {
    fn from(route: &'a Route) -> Self {
        Self {
            id: &route.id,
            name: &route.name,
            description: &route.description,
            waypoints: route.waypoints.len(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, request) = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    info!("Starting passage v{}", env!("CARGO_PKG_VERSION"));

    let catalog = config.catalog().map_err(|e| {
        log_error(&e, "route catalog");
        e
    })?;
    info!(routes = catalog.len(), "Route catalog ready");

    if request.list_routes {
        let listing: Vec<RouteListing> = catalog.list().iter().map(RouteListing::from).collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    let departure = match &request.departure {
        Some(text) => passage::parse_departure(text)?,
        None => Utc::now(),
    };

    let settings = config.pipeline_settings()?;
    let providers = config.providers();
    let pipeline = ForecastPipeline::new(&catalog, settings);

    let run = pipeline
        .run_concurrent(
            &request.route,
            departure,
            config.forecast.vessel_speed,
            &providers,
        )
        .await
        .map_err(|e| {
            log_error(&e, "forecast run");
            e
        })
        .with_context(|| format!("Forecast failed for route {}", request.route))?;

    info!(
        route_id = %run.route_id,
        models = run.models.len(),
        skipped = run.skipped.len(),
        "Forecast complete"
    );

    let document = log_timed_operation("render_json", || serde_json::to_string_pretty(&run))?;
    println!("{}", document);
    Ok(())
}
