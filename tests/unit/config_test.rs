//! Tests for configuration validation

use std::path::PathBuf;

use node_usage_admission::config::{LedgerConfig, StoreBackendConfig};

#[test]
fn test_file_config_validation() {
    let valid = LedgerConfig::file("/var/lib/scheduler/nodeusage");
    assert!(valid.validate().is_ok());
}

#[test]
fn test_file_config_requires_dir() {
    let invalid = LedgerConfig {
        store: StoreBackendConfig::File,
        db_dir: None,
        store_file: "nodeusage.json".into(),
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_file_config_requires_absolute_dir() {
    let invalid = LedgerConfig::file(PathBuf::from("relative/db"));
    assert!(invalid.validate().is_err());
}

#[test]
fn test_empty_store_file_rejected() {
    let mut invalid = LedgerConfig::in_memory();
    invalid.store_file = String::new();
    assert!(invalid.validate().is_err());
}

#[test]
fn test_ledger_config_from_json() {
    let json = r#"{
        "store": "file",
        "db_dir": "/tmp/nodeusage"
    }"#;

    let config = LedgerConfig::from_json_str(json).unwrap();
    assert_eq!(config.store, StoreBackendConfig::File);
    assert_eq!(config.store_file, "nodeusage.json");
}

#[test]
fn test_ledger_config_from_json_invalid() {
    let json = r#"{ "store": "file" }"#;
    assert!(LedgerConfig::from_json_str(json).is_err());
    assert!(LedgerConfig::from_json_str("not json").is_err());
}
