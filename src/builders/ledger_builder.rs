//! Builders to construct token stores and ledgers from configuration.

use crate::config::{LedgerConfig, StoreBackendConfig};
use crate::core::{LedgerError, TokenLedger, TokenStore};
use crate::infra::{FileTokenStore, InMemoryTokenStore};

/// Build the store backend selected by `cfg`.
pub fn build_store(cfg: &LedgerConfig) -> Result<Box<dyn TokenStore>, LedgerError> {
    cfg.validate()
        .map_err(|e| LedgerError::Config(format!("config invalid: {e}")))?;

    match cfg.store {
        StoreBackendConfig::InMemory => Ok(Box::new(InMemoryTokenStore::new())),
        StoreBackendConfig::File => {
            let dir = cfg
                .db_dir
                .as_ref()
                .ok_or_else(|| LedgerError::Config("db_dir is required".into()))?;
            Ok(Box::new(FileTokenStore::new(dir, cfg.store_file.clone())?))
        }
    }
}

/// Build and open a ledger from configuration.
pub fn build_ledger(cfg: &LedgerConfig) -> Result<TokenLedger, LedgerError> {
    TokenLedger::open(build_store(cfg)?)
}
