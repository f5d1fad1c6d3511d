//! Tests for builder modules

use node_usage_admission::builders::{build_ledger, build_store};
use node_usage_admission::config::{LedgerConfig, StoreBackendConfig};
use node_usage_admission::core::LedgerError;

#[test]
fn test_build_in_memory_ledger() {
    let ledger = build_ledger(&LedgerConfig::in_memory()).unwrap();
    ledger.add_job("job1", 2);
    assert_eq!(ledger.node_usage_tokens().remaining("job1"), Some(2));
}

#[test]
fn test_build_file_ledger_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let db_dir = dir.path().join("nested").join("db");
    let ledger = build_ledger(&LedgerConfig::file(&db_dir)).unwrap();
    ledger.add_job("job1", 2);
    assert!(db_dir.join("nodeusage.json").is_file());
}

#[test]
fn test_build_store_rejects_invalid_config() {
    let cfg = LedgerConfig {
        store: StoreBackendConfig::File,
        db_dir: None,
        store_file: "nodeusage.json".into(),
    };
    assert!(matches!(build_store(&cfg), Err(LedgerError::Config(_))));
}

#[test]
fn test_build_store_rejects_file_as_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("occupied");
    std::fs::write(&file, b"x").unwrap();
    assert!(matches!(
        build_store(&LedgerConfig::file(&file)),
        Err(LedgerError::Config(_))
    ));
}
