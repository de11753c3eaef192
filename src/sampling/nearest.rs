//! Nearest-neighbor lookups on coordinate axes.
//!
//! Each axis is searched independently, which is the planar nearest cell for
//! a regular lat/lon grid. Ties go to the lower index.

/// Index of the axis value closest to `value`; `None` for a non-finite value
pub fn nearest_index(axis: &[f64], value: f64) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let mut closest: Option<(usize, f64)> = None;
    for (i, &coord) in axis.iter().enumerate() {
        let diff = (coord - value).abs();
        match closest {
            Some((_, min_diff)) if diff >= min_diff => {}
            _ => closest = Some((i, diff)),
        }
    }
    closest.map(|(i, _)| i)
}

/// Index of the forecast hour closest to `target` (in hours)
pub fn nearest_hour_index(hours: &[i32], target: f64) -> Option<usize> {
    if !target.is_finite() {
        return None;
    }
    let mut closest: Option<(usize, f64)> = None;
    for (i, &hour) in hours.iter().enumerate() {
        let diff = (f64::from(hour) - target).abs();
        match closest {
            Some((_, min_diff)) if diff >= min_diff => {}
            _ => closest = Some((i, diff)),
        }
    }
    closest.map(|(i, _)| i)
}

/// Express `lon` in the same convention as the grid's longitude axis.
///
/// Grids stored as 0..360 get negative longitudes shifted up, grids stored
/// as -180..180 get longitudes above 180 shifted down.
pub fn wrap_longitude(lon: f64, axis: &[f64]) -> f64 {
    let max = axis.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = axis.iter().copied().fold(f64::INFINITY, f64::min);
    if max > 180.0 && lon < 0.0 {
        lon + 360.0
    } else if min < 0.0 && lon > 180.0 {
        lon - 360.0
    } else {
        lon
    }
}
