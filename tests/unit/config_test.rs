//! Tests for run configuration loading

use std::fs;
use std::path::PathBuf;

use image_updater::config::{DEFAULT_CONFIG_PATH, LOCAL_CONFIG_FILE, RunConfig};
use serial_test::serial;
use tempfile::TempDir;

// =============================================================================
// DEFAULTS AND PARSING
// =============================================================================

#[test]
fn test_config_default() {
    let config = RunConfig::default();
    assert_eq!(config.api_url, "https://api.github.com");
    assert_eq!(config.config_path, DEFAULT_CONFIG_PATH);
    assert_eq!(config.output_dir, PathBuf::from("."));
    assert!(config.organization.is_none());
    assert!(config.branch.is_none());
    assert!(config.timeout_secs.is_none());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let config = RunConfig::from_toml_str(
        r#"
organization = "acme"
branch = "ImageUpdates"
deprecated_images = ["ubuntu-2004:202010-01"]
"#,
    )
    .unwrap();

    assert_eq!(config.organization.as_deref(), Some("acme"));
    assert_eq!(config.branch.as_deref(), Some("ImageUpdates"));
    assert_eq!(config.pr_title, "Update deprecated image tags");
}

#[test]
fn test_registry_extends_builtin() {
    let config =
        RunConfig::from_toml_str("deprecated_images = [\"ubuntu-2004:202010-01\"]").unwrap();
    let registry = config.registry();
    assert!(registry.is_deprecated("ubuntu-2004:202010-01"));
    assert!(registry.is_deprecated("ubuntu-2204:2023.08.1"));
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_publish_settings() {
    let config = RunConfig::from_toml_str("config_path = \"ci/config.yml\"").unwrap();
    let settings = config.publish_settings("Fix");
    assert_eq!(settings.branch, "Fix");
    assert_eq!(settings.config_path, "ci/config.yml");
    assert_eq!(settings.commit_message, "Automatic image update for deprecated images.");
}

#[test]
fn test_invalid_toml_is_error() {
    assert!(RunConfig::from_toml_str("organization = [").is_err());
    assert!(RunConfig::from_toml_str("timeout_secs = \"soon\"").is_err());
}

// =============================================================================
// FILE LOOKUP
// =============================================================================

#[test]
fn test_explicit_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");
    fs::write(&path, "organization = \"explicit\"\ntimeout_secs = 10\n").unwrap();

    let config = RunConfig::load(Some(&path)).unwrap();
    assert_eq!(config.organization.as_deref(), Some("explicit"));
    assert_eq!(config.timeout_secs, Some(10));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let temp = TempDir::new().unwrap();
    assert!(RunConfig::load(Some(&temp.path().join("nope.toml"))).is_err());
}

#[test]
#[serial(cwd)]
fn test_local_file_found_in_cwd() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(LOCAL_CONFIG_FILE), "organization = \"local\"\n").unwrap();

    let original = std::env::current_dir().unwrap();
    std::env::set_current_dir(temp.path()).unwrap();
    let config = RunConfig::load(None);
    std::env::set_current_dir(original).unwrap();

    assert_eq!(config.unwrap().organization.as_deref(), Some("local"));
}

#[test]
fn test_save_round_trip_through_toml() {
    let mut config = RunConfig::default();
    config.organization = Some("acme".to_string());
    config.deprecated_images.push("x:1".to_string());

    let text = toml::to_string_pretty(&config).unwrap();
    assert_eq!(RunConfig::from_toml_str(&text).unwrap(), config);
}
