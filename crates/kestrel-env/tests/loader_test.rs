//! Integration tests for environment loading and merging.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use kestrel_common::error::KestrelError;
use kestrel_env::{EnvironmentLoader, MemoryEnv, ProcessEnv};

fn write_env(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(format!("{name}.json")), content).expect("write environment");
}

#[tokio::test]
async fn process_values_win_over_declared_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_env(dir.path(), "dev", r#"{ "A": "1", "B": "2" }"#);
    let process = Arc::new(MemoryEnv::with_vars([("B", "9")]));
    let loader = EnvironmentLoader::new(dir.path(), Arc::clone(&process) as Arc<dyn ProcessEnv>);

    let environment = loader.load("dev").await.expect("load");
    assert_eq!(environment.name(), "dev");
    assert_eq!(environment.get("A"), Some("1"));
    assert_eq!(environment.get("B"), Some("9"));
    assert_eq!(environment.values().len(), 2);

    let exported = process.vars();
    assert_eq!(exported.get("A").map(String::as_str), Some("1"), "missing keys exported");
    assert_eq!(exported.get("B").map(String::as_str), Some("9"), "process value kept");
}

#[tokio::test]
async fn process_only_keys_pass_through() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_env(dir.path(), "dev", r#"{ "A": "1" }"#);
    let process = Arc::new(MemoryEnv::with_vars([("HOME", "/home/app")]));
    let loader = EnvironmentLoader::new(dir.path(), process);

    let environment = loader.load("dev").await.expect("load");
    assert_eq!(environment.get("HOME"), Some("/home/app"));
    assert_eq!(environment.get("A"), Some("1"));
}

#[tokio::test]
async fn accessors_fail_before_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loader = EnvironmentLoader::new(dir.path(), Arc::new(MemoryEnv::new()));

    assert!(!loader.is_loaded());
    assert!(matches!(loader.name(), Err(KestrelError::EnvironmentNotLoaded)));
    assert!(matches!(
        loader.environment(),
        Err(KestrelError::EnvironmentNotLoaded)
    ));
    assert!(matches!(loader.get("A"), Err(KestrelError::EnvironmentNotLoaded)));
}

#[tokio::test]
async fn second_load_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_env(dir.path(), "dev", r#"{ "A": "1" }"#);
    write_env(dir.path(), "prod", r#"{ "A": "2" }"#);
    let loader = EnvironmentLoader::new(dir.path(), Arc::new(MemoryEnv::new()));

    let _ = loader.load("dev").await.expect("first load");
    let err = loader.load("prod").await.expect_err("second load");
    match err {
        KestrelError::EnvironmentAlreadyLoaded { current, requested } => {
            assert_eq!(current, "dev");
            assert_eq!(requested, "prod");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(loader.name().expect("name"), "dev");
    assert_eq!(loader.get("A").expect("A"), "1");
}

#[tokio::test]
async fn unknown_variable_is_a_property_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_env(dir.path(), "dev", r#"{ "A": "1" }"#);
    let loader = EnvironmentLoader::new(dir.path(), Arc::new(MemoryEnv::new()));
    let _ = loader.load("dev").await.expect("load");

    assert!(matches!(
        loader.get("MISSING"),
        Err(KestrelError::PropertyNotFound { .. })
    ));
}

#[tokio::test]
async fn missing_document_names_environment_and_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loader = EnvironmentLoader::new(dir.path(), Arc::new(MemoryEnv::new()));

    let err = loader.load("staging").await.expect_err("missing file");
    let message = err.to_string();
    assert!(message.contains("environment 'staging'"), "got: {message}");
    assert!(message.contains("staging.json"), "got: {message}");
    assert!(!loader.is_loaded());
}
