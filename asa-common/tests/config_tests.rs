//! Tests for configuration loading and data folder resolution
//!
//! Tests that set or clear ASA_DATA_DIR are marked #[serial] so they never
//! run in parallel with each other.

use asa_common::config::{
    default_data_dir, locate_config_file, resolve_data_dir, Settings, TomlConfig, DATA_DIR_ENV,
};
use asa_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(DATA_DIR_ENV);

    let resolved = resolve_data_dir(None, None);
    assert_eq!(resolved, default_data_dir());
}

#[test]
#[serial]
fn test_resolver_env_var_beats_toml() {
    env::set_var(DATA_DIR_ENV, "/tmp/asa-test-env");
    let toml = TomlConfig {
        data_dir: Some(PathBuf::from("/tmp/asa-test-toml")),
        ..Default::default()
    };

    let resolved = resolve_data_dir(None, Some(&toml));
    assert_eq!(resolved, PathBuf::from("/tmp/asa-test-env"));

    env::remove_var(DATA_DIR_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_used_without_env() {
    env::remove_var(DATA_DIR_ENV);
    let toml = TomlConfig {
        data_dir: Some(PathBuf::from("/tmp/asa-test-toml")),
        ..Default::default()
    };

    let resolved = resolve_data_dir(None, Some(&toml));
    assert_eq!(resolved, PathBuf::from("/tmp/asa-test-toml"));
}

#[test]
#[serial]
fn test_resolver_cli_beats_env() {
    env::set_var(DATA_DIR_ENV, "/tmp/asa-test-env");

    let resolved = resolve_data_dir(Some(Path::new("/tmp/asa-test-cli")), None);
    assert_eq!(resolved, PathBuf::from("/tmp/asa-test-cli"));

    env::remove_var(DATA_DIR_ENV);
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = TomlConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.update.results_grade_label, "Competent");
}

#[test]
fn test_malformed_config_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("asa.toml");
    fs::write(&path, "[logging\nlevel = ").unwrap();
    assert!(matches!(
        TomlConfig::load_or_default(&path),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_config_found_in_data_folder() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("asa.toml");
    fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

    assert_eq!(locate_config_file(None, Some(dir.path())), path);
    let explicit = PathBuf::from("/etc/asa/custom.toml");
    assert_eq!(locate_config_file(Some(&explicit), Some(dir.path())), explicit);
}

#[test]
#[serial]
fn test_settings_load_reads_data_folder_config() {
    env::remove_var(DATA_DIR_ENV);
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("asa.toml"),
        "[analysis]\nkeep_transfers = false\n\n[update]\ntransfer_markers = [\"transfer\"]\n",
    )
    .unwrap();

    let settings = Settings::load(None, Some(dir.path())).unwrap();
    assert_eq!(settings.data_dir, dir.path());
    assert!(!settings.config.analysis.keep_transfers);
    assert_eq!(settings.config.update.transfer_markers, vec!["transfer"]);
    assert_eq!(settings.config.update.non_assessment_items, vec!["Course total"]);
}
