//! Ledger store configuration structures.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::core::AppResult;
use crate::infra::FileTokenStore;

/// Environment variable holding the absolute store directory.
pub const DB_DIR_ENV: &str = "NODE_USAGE_DB_DIR";

/// Environment variable overriding the store file name.
pub const STORE_FILE_ENV: &str = "NODE_USAGE_STORE_FILE";

/// Store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-memory store for development/testing.
    InMemory,
    /// JSON document on disk.
    File,
}

fn default_store_file() -> String {
    FileTokenStore::DEFAULT_FILE_NAME.to_string()
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Store backend selection.
    pub store: StoreBackendConfig,
    /// Absolute directory holding the store (file backend only).
    #[serde(default)]
    pub db_dir: Option<PathBuf>,
    /// Store file name inside `db_dir`.
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl LedgerConfig {
    /// In-memory ledger configuration.
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackendConfig::InMemory,
            db_dir: None,
            store_file: default_store_file(),
        }
    }

    /// File-backed ledger configuration rooted at `db_dir`.
    pub fn file(db_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreBackendConfig::File,
            db_dir: Some(db_dir.into()),
            store_file: default_store_file(),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.store_file.is_empty() {
            return Err("store_file must not be empty".into());
        }
        if self.store_file.starts_with('.') || self.store_file.contains(['/', '\\']) {
            return Err(format!("store_file `{}` must be a plain file name", self.store_file));
        }
        if self.store == StoreBackendConfig::File {
            match &self.db_dir {
                None => return Err("db_dir is required for the file store".into()),
                Some(dir) if !dir.is_absolute() => {
                    return Err(format!("db_dir `{}` must be absolute", dir.display()));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Parse ledger configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read configuration from the environment, loading `.env` first.
    ///
    /// Without `NODE_USAGE_DB_DIR` the ledger stays in memory.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = match env::var_os(DB_DIR_ENV) {
            Some(dir) => Self::file(dir),
            None => Self::in_memory(),
        };
        match env::var(STORE_FILE_ENV) {
            Ok(name) => cfg.store_file = name,
            Err(env::VarError::NotPresent) => {}
            Err(e) => return Err(e).context(format!("{STORE_FILE_ENV} is not usable")),
        }
        if let Err(e) = cfg.validate() {
            bail!("invalid ledger configuration: {e}");
        }
        Ok(cfg)
    }
}
