//! Error types for the certmerge reconciliation engine.

use thiserror::Error;

/// Storage-related errors raised by a document backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    #[error("Permission denied: {operation} on collection '{collection}'")]
    PermissionDenied {
        collection: String,
        operation: &'static str,
    },

    #[error("Transient storage error: {0}")]
    Transient(String),

    #[error("Invalid document {collection}/{key}: {reason}")]
    InvalidDocument {
        collection: String,
        key: String,
        reason: String,
    },

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// True for permission failures, including I/O errors of kind `PermissionDenied`.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            StorageError::PermissionDenied { .. } => true,
            StorageError::IoError(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

/// Engine and CLI errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Invalid resolution action: '{0}' (expected keep-primary, keep-secondary or merge-to-primary)")]
    InvalidResolution(String),

    #[error("Certification number {0} is not present in both collections")]
    NotADuplicate(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
