//! Integration tests for Settings loading with a local config file.
//!
//! Note: These tests use temp directories for the local layer; a global
//! config on the machine running them must not set the keys under test.

use std::fs;

use tempfile::TempDir;

use rsforest::config::{local_config_path, Settings};

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "show_order = true\nroot_label = \"menu\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert!(settings.show_order);
    assert_eq!(settings.root_label, "menu");
}

#[test]
fn given_directory_without_config_when_load_then_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert!(!settings.strict_parents);
}

#[test]
fn given_invalid_local_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "show_order = \"maybe\"\n").unwrap();

    let result = Settings::load(Some(dir.path()));

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("config error"));
}
