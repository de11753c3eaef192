//! Named maritime routes.
//!
//! The catalog is an explicitly constructed, read-only registry. Callers build
//! it once at startup and pass it by reference into the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::error::{PassageError, Result};

/// A named position along a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Display name of the waypoint
    pub name: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }

    /// Finite coordinates with latitude in [-90, 90] and longitude in [-180, 360]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=360.0).contains(&self.lon)
    }
}

/// An ordered sequence of waypoints with an identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Unique route id
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Waypoints in sailing order (at least two)
    pub waypoints: Vec<Waypoint>,
}

impl Route {
    /// Number of legs (consecutive waypoint pairs)
    pub fn leg_count(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }
}

/// Registry of routes in registration order
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the built-in routes
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        // Built-in ids are distinct and every built-in route has several waypoints.
        for route in default_routes() {
            catalog.push(route);
        }
        catalog
    }

    fn push(&mut self, route: Route) {
        self.index.insert(route.id.clone(), self.routes.len());
        self.routes.push(route);
    }

    /// Add a route, rejecting duplicate ids, routes with fewer than two
    /// waypoints and waypoints off the globe
    pub fn register(&mut self, route: Route) -> Result<()> {
        if route.waypoints.len() < 2 {
            return Err(PassageError::invalid_input(
                "route",
                format!(
                    "Route {} needs at least 2 waypoints, got {}",
                    route.id,
                    route.waypoints.len()
                ),
            ));
        }
        if let Some(bad) = route.waypoints.iter().find(|w| !w.is_valid()) {
            return Err(PassageError::invalid_input(
                "route",
                format!(
                    "Route {} waypoint {} has invalid coordinates ({}, {})",
                    route.id, bad.name, bad.lat, bad.lon
                ),
            ));
        }
        if self.index.contains_key(&route.id) {
            return Err(PassageError::invalid_input(
                "route",
                format!("Duplicate route id: {}", route.id),
            ));
        }
        self.push(route);
        Ok(())
    }

    /// Add every route from a JSON file holding an array of routes
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let routes: Vec<Route> = serde_json::from_str(&content)?;
        let count = routes.len();
        for route in routes {
            self.register(route)?;
        }
        info!(
            path = %path.display(),
            routes = count,
            "Loaded routes from file"
        );
        Ok(count)
    }

    /// Find a route by id
    pub fn lookup(&self, id: &str) -> Result<&Route> {
        self.index
            .get(id)
            .map(|&i| &self.routes[i])
            .ok_or_else(|| PassageError::RouteNotFound {
                route_id: id.to_string(),
            })
    }

    /// All routes in registration order
    pub fn list(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn default_routes() -> Vec<Route> {
    vec![Route {
        id: "lakecharles-kemah".to_string(),
        name: "Lake Charles to Kemah".to_string(),
        description: "Bord du Lac Marina → Calcasieu Pass → Galveston Entrance → Kemah Boardwalk Marina"
            .to_string(),
        waypoints: vec![
            Waypoint::new("Bord du Lac Marina", 30.2247, -93.2174),
            Waypoint::new("Calcasieu Pass", 29.7681, -93.3432),
            Waypoint::new("Galveston Entrance", 29.3567, -94.7210),
            Waypoint::new("Kemah Boardwalk Marina", 29.5420, -95.0185),
        ],
    }]
}
