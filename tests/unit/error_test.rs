//! Tests for error types

use node_usage_admission::core::LedgerError;

#[test]
fn test_config_error() {
    let err = LedgerError::Config("db_dir missing".to_string());
    assert_eq!(format!("{}", err), "configuration error: db_dir missing");
}

#[test]
fn test_corrupted_error() {
    let err = LedgerError::Corrupted("nodeusage.json".to_string());
    assert_eq!(format!("{}", err), "store corrupted: nodeusage.json");
}

#[test]
fn test_closed_error() {
    assert_eq!(format!("{}", LedgerError::Closed), "store closed");
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err = LedgerError::from(io);
    assert!(matches!(err, LedgerError::Io(_)));
    assert_eq!(format!("{}", err), "store I/O error: gone");
}
