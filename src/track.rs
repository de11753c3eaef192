//! Great-circle track generation.
//!
//! Legs are measured with the haversine formula on a spherical earth and
//! subdivided into equal time steps. Intermediate positions come from
//! spherical linear interpolation along the arc, so the track follows the
//! true great circle rather than a straight line in lat/lon space.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PassageError, Result};
use crate::routes::{Route, Waypoint};

/// Mean earth radius in nautical miles
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Default spacing between track points, in hours
pub const DEFAULT_STEP_HOURS: f64 = 1.0;

/// Label given to points strictly inside a leg
pub const INTERIOR_LABEL: &str = "leg";

/// Upper bound on time steps in a single leg
pub const MAX_STEPS_PER_LEG: usize = 100_000;

/// Fractions at or above this are treated as the end of a leg for labeling
const LEG_END_FRACTION: f64 = 0.999;

/// A time-stamped position along a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Waypoint name at leg ends, `leg` in between
    pub label: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Estimated time of arrival
    pub time_utc: DateTime<Utc>,
}

/// Great-circle distance between two waypoints in nautical miles
pub fn haversine_distance_nm(a: &Waypoint, b: &Waypoint) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * h.sqrt().asin()
}

/// Position at `fraction` of the way from `a` to `b` along the great circle.
///
/// Coincident waypoints return `a` unchanged.
pub fn interpolate_point(a: &Waypoint, b: &Waypoint, fraction: f64) -> (f64, f64) {
    let delta = haversine_distance_nm(a, b) / EARTH_RADIUS_NM;
    if delta == 0.0 {
        return (a.lat, a.lon);
    }

    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());

    let sin_delta = delta.sin();
    let factor_a = ((1.0 - fraction) * delta).sin() / sin_delta;
    let factor_b = (fraction * delta).sin() / sin_delta;

    let x = factor_a * lat1.cos() * lon1.cos() + factor_b * lat2.cos() * lon2.cos();
    let y = factor_a * lat1.cos() * lon1.sin() + factor_b * lat2.cos() * lon2.sin();
    let z = factor_a * lat1.sin() + factor_b * lat2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);
    (lat.to_degrees(), lon.to_degrees())
}

/// Build the time-stamped track for a route.
///
/// Each leg contributes `max(1, ceil(leg_hours / step_hours)) + 1` points, so
/// the shared waypoint between two legs appears twice with the same ETA.
///
/// Fails with `InvalidInput` when a leg needs more than
/// [`MAX_STEPS_PER_LEG`] steps or an ETA leaves chrono's date range.
pub fn generate_track(
    route: &Route,
    departure: DateTime<Utc>,
    speed_knots: f64,
    step_hours: f64,
) -> Result<Vec<TrackPoint>> {
    if !speed_knots.is_finite() || speed_knots <= 0.0 {
        return Err(PassageError::invalid_input(
            "speed_knots",
            format!("Speed must be a positive number of knots, got {}", speed_knots),
        ));
    }
    if !step_hours.is_finite() || step_hours <= 0.0 {
        return Err(PassageError::invalid_input(
            "step_hours",
            format!("Step must be a positive number of hours, got {}", step_hours),
        ));
    }

    let mut points = Vec::new();
    let mut elapsed_hours = 0.0;

    for leg in route.waypoints.windows(2) {
        let (start, end) = (&leg[0], &leg[1]);
        let leg_hours = haversine_distance_nm(start, end) / speed_knots;
        let raw_steps = (leg_hours / step_hours).ceil();
        if !raw_steps.is_finite() || raw_steps > MAX_STEPS_PER_LEG as f64 {
            return Err(PassageError::invalid_input(
                "step_hours",
                format!(
                    "Leg {} -> {} would need {} steps at {} kt every {} h, limit is {}",
                    start.name, end.name, raw_steps, speed_knots, step_hours, MAX_STEPS_PER_LEG
                ),
            ));
        }
        let steps = (raw_steps as usize).max(1);

        for step in 0..=steps {
            let fraction = (step as f64 / steps as f64).min(1.0);
            let (lat, lon) = interpolate_point(start, end, fraction);
            let label = if step == 0 {
                start.name.clone()
            } else if fraction >= LEG_END_FRACTION {
                end.name.clone()
            } else {
                INTERIOR_LABEL.to_string()
            };

            let time_utc = hours_to_duration(elapsed_hours + fraction * leg_hours)
                .and_then(|offset| departure.checked_add_signed(offset))
                .ok_or_else(|| {
                    PassageError::invalid_input(
                        "speed_knots",
                        format!(
                            "ETA at {} kt falls outside the representable date range",
                            speed_knots
                        ),
                    )
                })?;

            points.push(TrackPoint {
                label,
                lat,
                lon,
                time_utc,
            });
        }

        elapsed_hours += leg_hours;
    }

    Ok(points)
}

/// Convert fractional hours to a duration with microsecond resolution.
///
/// `None` when the value does not fit in an `i64` count of microseconds.
fn hours_to_duration(hours: f64) -> Option<Duration> {
    let micros = (hours * 3_600_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::microseconds(micros as i64))
}
