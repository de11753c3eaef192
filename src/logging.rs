//! Logging for forecast runs.
//!
//! Output goes to stderr so stdout carries only the JSON forecast document.
//! Models that drop out of a run (missing dataset, duplicate provider, empty
//! sampling) are reported at warn level with a `model` field. Runs are
//! tagged with a uuid run id.

use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::PassageError;

/// Initialize the tracing subscriber with the given log level.
///
/// `RUST_LOG`, when set, wins over `log_level`.
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    // Logs go to stderr; stdout carries the forecast document
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Log a start message for a significant operation
pub fn log_operation_start(operation: &str, details: Option<&str>) {
    if let Some(details) = details {
        info!(
            operation = operation,
            details = details,
            "Starting operation"
        );
    } else {
        info!(operation = operation, "Starting operation");
    }
}

/// Log the completion of a significant operation
pub fn log_operation_end(operation: &str, start_time: Instant, success: bool) {
    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

    if success {
        info!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed successfully"
        );
    } else {
        warn!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed with warnings"
        );
    }
}

/// Run `f`, logging its duration under a fresh run id
pub fn log_timed_operation<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let run_id = generate_run_id();

    debug!(operation = operation, run_id = %run_id, "Starting operation");

    let result = f();

    info!(
        operation = operation,
        run_id = %run_id,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Operation completed"
    );

    result
}

/// Log an error with context
pub fn log_error(error: &PassageError, context: &str) {
    match error {
        // A missing model is an expected, recoverable outcome
        PassageError::DatasetUnavailable { model, .. } => warn!(
            error = %error,
            model = %model,
            context = context,
            "Model skipped"
        ),
        _ => error!(
            error = %error,
            context = context,
            error_type = std::any::type_name_of_val(error),
            "Error occurred"
        ),
    }
}

/// Log a model that was left out of a run for a reason other than an error
pub fn log_model_skip(model: &str, reason: &str) {
    warn!(model = model, reason = reason, "Model skipped");
}

/// Generate a unique run ID
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();

        assert_eq!(id1.len(), 36);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_log_timed_operation() {
        let result = log_timed_operation("test_operation", || {
            std::thread::sleep(Duration::from_millis(1));
            42
        });

        assert_eq!(result, 42);
    }

    #[test]
    fn test_log_error_does_not_panic() {
        log_error(
            &PassageError::dataset_unavailable("gfs", "missing file"),
            "dataset fetch",
        );
        log_error(
            &PassageError::RouteNotFound {
                route_id: "nowhere".to_string(),
            },
            "lookup",
        );
        log_operation_end("test_operation", Instant::now(), false);
    }

    #[test]
    fn test_log_model_skip_does_not_panic() {
        log_model_skip("gfs", "no samples along the track");
    }
}
