//! Config loader facade: assembles sources in precedence order and deserializes.

use super::merge::merge_policy::{builder_with_defaults, environment_source};
use super::sources::{global_file, workspace_file};
use super::CertmergeConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};

/// Loads `CertmergeConfig` from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults → global file → workspace files → environment.
    pub fn load(workspace_root: &Path) -> Result<CertmergeConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        builder
            .add_source(environment_source())
            .build()?
            .try_deserialize()
    }

    /// Defaults → the given file → environment. Skips global and workspace files.
    pub fn load_from_file(path: &Path) -> Result<CertmergeConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .add_source(environment_source())
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only.
    pub fn default() -> CertmergeConfig {
        CertmergeConfig::default()
    }

    /// Location of the user-level config file, if the platform defines one.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
