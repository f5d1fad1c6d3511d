//! Configuration models for the ledger store.

pub mod ledger;

pub use ledger::{LedgerConfig, StoreBackendConfig, DB_DIR_ENV, STORE_FILE_ENV};
