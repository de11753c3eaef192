//! Error types for the passage crate.
//!
//! A single enum covers every failure the forecast core can surface. Missing
//! weather variables are not represented here. Sampling, hazard
//! and comparison logic degrade instead of failing.

use thiserror::Error;

/// The main error type for passage operations.
#[derive(Error, Debug)]
pub enum PassageError {
    /// Unknown route id
    #[error("Route not found: {route_id}")]
    RouteNotFound { route_id: String },

    /// Rejected caller input (speed, departure time, offsets, routes)
    #[error("Invalid input: {param} - {message}")]
    InvalidInput { param: String, message: String },

    /// A model's dataset provider could not deliver a usable grid
    #[error("Dataset unavailable for model {model}: {message}")]
    DatasetUnavailable { model: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Grid arrays whose shape does not match their axes
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// NetCDF file operation errors
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

impl PassageError {
    pub(crate) fn invalid_input(param: &str, message: impl Into<String>) -> Self {
        PassageError::InvalidInput {
            param: param.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn dataset_unavailable(model: &str, message: impl Into<String>) -> Self {
        PassageError::DatasetUnavailable {
            model: model.to_string(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results with PassageError
pub type Result<T> = std::result::Result<T, PassageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PassageError::RouteNotFound {
            route_id: "nowhere".to_string(),
        };
        assert_eq!(err.to_string(), "Route not found: nowhere");

        let err = PassageError::invalid_input("speed_knots", "must be positive");
        assert_eq!(err.to_string(), "Invalid input: speed_knots - must be positive");

        let err = PassageError::dataset_unavailable("gfs", "no files");
        assert_eq!(err.to_string(), "Dataset unavailable for model gfs: no files");
    }
}
