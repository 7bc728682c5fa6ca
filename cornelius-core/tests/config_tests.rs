//! Config load error-message and validation integration tests.

use std::fs;
use std::time::Duration;

use assert_fs::prelude::*;
use cornelius_core::{Config, ConfigError, PipelineName};
use predicates::prelude::predicate;

const TWO_PIPELINES: &str = r#"
concurrency: 2
tmp_directory: /var/tmp/cornelius
pipelines:
  - name: site
    bucket:
      host: minio.local:9000
      name: assets
      prefix: public/
      access_id: AKIAEXAMPLE
      secret_key: secret
      is_secure: true
      is_recursive: true
    drive:
      id: drive-1
      wallet_path: /etc/cornelius/wallet.json
      password: pw
      parent_folder_id: folder-1
      is_public: false
    enable_manifest: true
    frequency: 1h30m
  - name: archive
    bucket:
      host: s3.example.com
      name: archive
    drive:
      id: drive-2
      wallet_path: /etc/cornelius/wallet.json
      parent_folder_id: folder-2
      is_public: true
"#;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_file_returns_io_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("cornelius.yaml");
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("cornelius.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("cornelius.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("cornelius.yaml"), "must contain file path, got: {msg}");
}

#[test]
fn load_wrong_type_yaml_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("cornelius.yaml");
    file.write_str("- this is a list, not a mapping\n").expect("write");

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn load_bad_frequency_reports_the_offending_value() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("cornelius.yaml");
    file.write_str(&TWO_PIPELINES.replace("frequency: 1h30m", "frequency: soon"))
        .expect("write");

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("soon"), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Successful load
// ---------------------------------------------------------------------------

#[test]
fn load_full_document() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("cornelius.yaml");
    file.write_str(TWO_PIPELINES).expect("write");
    file.assert(predicate::path::is_file());

    let config = Config::load(file.path()).expect("load");
    assert_eq!(config.concurrency, Some(2));
    assert_eq!(config.pipelines.len(), 2);

    let site = &config.pipelines[0];
    assert_eq!(site.name, PipelineName::from("site"));
    assert_eq!(site.bucket.prefix, "public/");
    assert!(site.bucket.is_secure && site.bucket.is_recursive);
    assert!(site.enable_manifest);
    assert_eq!(site.frequency.as_duration(), Duration::from_secs(5400));

    let archive = &config.pipelines[1];
    assert!(archive.drive.is_public);
    assert!(archive.frequency.is_single_shot());
    assert_eq!(archive.drive.password, "");
}

// ---------------------------------------------------------------------------
// 3. Validation
// ---------------------------------------------------------------------------

#[test]
fn duplicate_pipeline_names_are_rejected() {
    let yaml = TWO_PIPELINES.replace("- name: archive", "- name: site");
    let err = Config::from_yaml_str(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
    assert!(err.to_string().contains("duplicate pipeline name 'site'"));
}

#[test]
fn empty_parent_folder_is_rejected() {
    let yaml = TWO_PIPELINES.replace("parent_folder_id: folder-2", "parent_folder_id: \"\"");
    let err = Config::from_yaml_str(&yaml).unwrap_err();
    assert!(err.to_string().contains("drive.parent_folder_id"), "got: {err}");
}

#[test]
fn zero_concurrency_is_rejected() {
    let yaml = TWO_PIPELINES.replace("concurrency: 2", "concurrency: 0");
    let err = Config::from_yaml_str(&yaml).unwrap_err();
    assert!(err.to_string().contains("concurrency"), "got: {err}");
}

#[test]
fn serialized_config_loads_back() {
    let config = Config::from_yaml_str(TWO_PIPELINES).expect("parse");
    let dir = tempfile::TempDir::new().expect("tempdir");
    let path = dir.path().join("copy.yaml");
    fs::write(&path, serde_yaml::to_string(&config).expect("serialize")).expect("write");

    let reloaded = Config::load(&path).expect("reload");
    assert_eq!(reloaded, config);
}
