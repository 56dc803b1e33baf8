//! Integration tests for config file resolution and loading

use serial_test::serial;
use simalyze_common::config::{
    load_config, load_toml_config, resolve_config_path, ConfigOrigin, CONFIG_ENV_VAR,
};
use simalyze_common::Error;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [logging]
        level = "debug"

        [api]
        base_url = "http://localhost:9999/api/v1"
        request_timeout_secs = 3

        [concurrency]
        fetch_limit = 2
        analysis_limit = 1

        [display]
        hide_enabled = true
        blur_enabled = false
        highlight_enabled = true
        highlight_threshold = 70

        [keyword]
        text = "clicker"
        penalty = -25
        "#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.logging.level.as_deref(), Some("debug"));
    assert_eq!(
        config.api.base_url.as_deref(),
        Some("http://localhost:9999/api/v1")
    );
    assert_eq!(config.api.request_timeout_secs, Some(3));
    assert_eq!(config.concurrency.fetch_limit, Some(2));
    assert_eq!(config.display.hide_enabled, Some(true));
    assert_eq!(config.display.highlight_threshold, Some(70));
    assert_eq!(config.keyword.text.as_deref(), Some("clicker"));
    assert_eq!(config.keyword.penalty, Some(-25));
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    fs::write(&path, "[display\nblur_enabled = yes").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {:?}", err);
}

#[test]
fn test_explicit_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli_argument() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("from-env.toml");
    fs::write(&path, "[display]\nblur_enabled = true\n").unwrap();

    std::env::set_var(CONFIG_ENV_VAR, &path);
    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    let loaded = load_config(None);
    std::env::remove_var(CONFIG_ENV_VAR);

    let (resolved_path, origin) = resolved.unwrap();
    assert_eq!(resolved_path, path);
    assert_eq!(origin, ConfigOrigin::Environment);
    assert_eq!(loaded.unwrap().display.blur_enabled, Some(true));
}

#[test]
#[serial]
fn test_cli_argument_beats_env_var() {
    let temp_dir = TempDir::new().unwrap();
    let cli_path = temp_dir.path().join("cli.toml");

    std::env::set_var(CONFIG_ENV_VAR, temp_dir.path().join("env.toml"));
    let resolved = resolve_config_path(Some(&cli_path), CONFIG_ENV_VAR);
    std::env::remove_var(CONFIG_ENV_VAR);

    let (path, origin) = resolved.unwrap();
    assert_eq!(path, cli_path);
    assert_eq!(origin, ConfigOrigin::CommandLine);
}
