//! Integration tests for Configuration System

use certmerge::config::{CertmergeConfig, ConfigLoader};
use certmerge::store::PermissionPolicy;
use tempfile::TempDir;

#[test]
fn test_config_file_drives_collections_and_policy() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("test_config.toml");

    std::fs::write(
        &config_file,
        r#"
[store]
path = ".cards/db"
primary = "cards_v2"
secondary = "cardsLegacy"

[engine]
on_permission_denied = "propagate"
atomic_moves = true
journal_retention = 5

[logging]
level = "warn"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());

    let pair = config.store.collections();
    assert_eq!(pair.primary.as_str(), "cards_v2");
    assert_eq!(pair.secondary.as_str(), "cardsLegacy");
    assert_eq!(config.engine.on_permission_denied, PermissionPolicy::Propagate);
    assert!(config.engine.atomic_moves);
    assert_eq!(config.engine.journal_retention, 5);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, "json");
    assert_eq!(
        config.store.resolve_path(temp_dir.path()),
        temp_dir.path().join(".cards/db")
    );
}

#[test]
fn test_missing_sections_fall_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("empty.toml");
    std::fs::write(&config_file, "").unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert_eq!(config.store.primary, "psa_cards");
    assert_eq!(config.store.secondary, "psaCards");
    assert_eq!(config.engine.on_permission_denied, PermissionPolicy::TreatAsEmpty);
}

#[test]
fn test_unknown_policy_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    std::fs::write(
        &config_file,
        r#"
[engine]
on_permission_denied = "ignore"
"#,
    )
    .unwrap();

    assert!(ConfigLoader::load_from_file(&config_file).is_err());
}

#[test]
fn test_invalid_logging_values_fail_validation() {
    let mut config = CertmergeConfig::default();
    config.logging.format = "yaml".to_string();
    config.logging.output = "syslog".to_string();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("nope.toml")).is_err());
}
