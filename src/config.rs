//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, workspace config
//! files, then `CERTMERGE__*` environment variables. Validated before use.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::store::PermissionPolicy;
use crate::types::CollectionPair;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use merge::merge_policy::{DEFAULT_PRIMARY, DEFAULT_SECONDARY, DEFAULT_STORE_PATH};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertmergeConfig {
    /// Document store location and collection names
    #[serde(default)]
    pub store: StoreConfig,

    /// Reconciliation engine behavior
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Store location and the two collections being reconciled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database directory; relative paths resolve against the workspace root
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Primary collection name
    #[serde(default = "default_primary")]
    pub primary: String,

    /// Secondary collection name
    #[serde(default = "default_secondary")]
    pub secondary: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_primary() -> String {
    DEFAULT_PRIMARY.to_string()
}

fn default_secondary() -> String {
    DEFAULT_SECONDARY.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            primary: default_primary(),
            secondary: default_secondary(),
        }
    }
}

impl StoreConfig {
    /// Absolute database path for `workspace_root`.
    pub fn resolve_path(&self, workspace_root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            workspace_root.join(&self.path)
        }
    }

    pub fn collections(&self) -> CollectionPair {
        CollectionPair::new(self.primary.as_str(), self.secondary.as_str())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }
        if self.primary.trim().is_empty() || self.secondary.trim().is_empty() {
            return Err("Collection names cannot be empty".to_string());
        }
        if self.primary == self.secondary {
            return Err(format!(
                "Primary and secondary collections must differ (both are '{}')",
                self.primary
            ));
        }
        Ok(())
    }
}

/// Engine behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Read-side handling of permission failures
    #[serde(default)]
    pub on_permission_denied: PermissionPolicy,

    /// Move each record in one backend transaction when the backend supports it
    #[serde(default)]
    pub atomic_moves: bool,

    /// Finished merge runs kept in the journal
    #[serde(default = "default_journal_retention")]
    pub journal_retention: usize,
}

fn default_journal_retention() -> usize {
    50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            on_permission_denied: PermissionPolicy::default(),
            atomic_moves: false,
            journal_retention: default_journal_retention(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Store(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Store(msg) => write!(f, "Store: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CertmergeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.store.validate() {
            errors.push(ValidationError::Store(e));
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log format '{}'",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stdout" | "stderr" | "file") {
            errors.push(ValidationError::Logging(format!(
                "Invalid log output '{}'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding all problems into one `ApiError`.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Render as TOML, e.g. for `certmerge init`.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
