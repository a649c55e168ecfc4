//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const DEFAULT_STORE_PATH: &str = ".certmerge/store";
pub const DEFAULT_PRIMARY: &str = "psa_cards";
pub const DEFAULT_SECONDARY: &str = "psaCards";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("store.path", DEFAULT_STORE_PATH)?
        .set_default("store.primary", DEFAULT_PRIMARY)?
        .set_default("store.secondary", DEFAULT_SECONDARY)?
        .set_default("engine.on_permission_denied", "treat_as_empty")?
        .set_default("engine.atomic_moves", false)?
        .set_default("engine.journal_retention", 50_i64)
}

/// Environment overrides, highest precedence: `CERTMERGE__STORE__PATH=...`.
pub fn environment_source() -> Environment {
    Environment::with_prefix("CERTMERGE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
