//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, StorageError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::StorageError(inner) if inner.is_permission_denied() => format!(
            "{}\nhint: set engine.on_permission_denied = \"treat_as_empty\" to read around it",
            e
        ),
        ApiError::StorageError(StorageError::Transient(_)) => {
            format!("{}\nhint: the operation can be retried", e)
        }
        _ => e.to_string(),
    }
}

/// Process exit code for a failed command.
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::InvalidResolution(_) | ApiError::InvalidInput(_) => 2,
        ApiError::ConfigError(_) => 3,
        _ => 1,
    }
}
