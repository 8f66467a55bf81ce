//! Tests for configuration loading and root folder resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate OSTMIX_ROOT are marked with #[serial].

use ostmix_common::config::{
    load_or_default, load_toml_config, locate_config_file, resolve_root_folder, TomlConfig,
    CONFIG_FILE_NAME, ROOT_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_argument_has_highest_priority() {
    env::set_var(ROOT_ENV_VAR, "/tmp/ostmix-env-root");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/ostmix-toml-root")),
        ..Default::default()
    };

    let root = resolve_root_folder(Some(Path::new("/tmp/ostmix-cli-root")), Some(&config));
    assert_eq!(root, PathBuf::from("/tmp/ostmix-cli-root"));

    env::remove_var(ROOT_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(ROOT_ENV_VAR, "/tmp/ostmix-env-root");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/ostmix-toml-root")),
        ..Default::default()
    };

    let root = resolve_root_folder(None, Some(&config));
    assert_eq!(root, PathBuf::from("/tmp/ostmix-env-root"));

    env::remove_var(ROOT_ENV_VAR);
}

#[test]
#[serial]
fn test_toml_root_used_without_cli_or_env() {
    env::remove_var(ROOT_ENV_VAR);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/ostmix-toml-root")),
        ..Default::default()
    };

    let root = resolve_root_folder(None, Some(&config));
    assert_eq!(root, PathBuf::from("/tmp/ostmix-toml-root"));
}

#[test]
#[serial]
fn test_fallback_is_current_directory() {
    env::remove_var(ROOT_ENV_VAR);
    assert_eq!(resolve_root_folder(None, None), PathBuf::from("."));
}

#[test]
fn test_config_file_in_root_is_found() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&config_path, "[audio]\nsegment_mean_db = -12.0\n").unwrap();

    let located = locate_config_file(None, Some(temp_dir.path()));
    assert_eq!(located, Some(config_path.clone()));

    let config = load_toml_config(&config_path).unwrap();
    assert_eq!(config.audio.segment_mean_db, -12.0);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let result = load_or_default(Some(&missing), None);
    assert!(result.is_err());
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&config_path, "[audio\nthis is not toml").unwrap();

    let result = load_toml_config(&config_path);
    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("Configuration error"), "got: {}", message);
}

#[test]
fn test_defaults_match_documented_targets() {
    let config = TomlConfig::default();
    assert_eq!(config.audio.segment_mean_db, -14.0);
    assert_eq!(config.audio.final_lufs, -14.0);
    assert_eq!(config.audio.ffmpeg, PathBuf::from("ffmpeg"));
    assert_eq!(config.hirc.object_tag, "obj");
    assert_eq!(config.hirc.field_tag, "fld");
    assert_eq!(config.video.preset, "medium");
}
