//! Error types for ledger and store operations.

use thiserror::Error;

/// Errors produced by the token ledger and its store backends.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Configuration is invalid or the store directory is unusable.
    #[error("configuration error: {0}")]
    Config(String),
    /// Underlying store I/O failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Persisted document could not be decoded.
    #[error("store corrupted: {0}")]
    Corrupted(String),
    /// Ledger tables could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Store handle was already closed.
    #[error("store closed")]
    Closed,
    /// Store could not be opened even after recreating it.
    #[error("store unrecoverable: {0}")]
    Unrecoverable(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
