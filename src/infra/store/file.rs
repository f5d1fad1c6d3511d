//! File-backed token store.
//!
//! The ledger tables are kept as one JSON document. Every commit writes a
//! fresh temp file next to it, syncs it and renames it over the document, so
//! a crash mid-commit leaves the previous state readable.

use std::fs::{self, create_dir_all, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::core::{LedgerError, LedgerTables, TokenStore};

/// File-backed store persisting the ledger tables as JSON.
pub struct FileTokenStore {
    dir: PathBuf,
    file_name: String,
    closed: bool,
}

impl FileTokenStore {
    /// Store file name used when none is configured.
    pub const DEFAULT_FILE_NAME: &'static str = "nodeusage.json";

    /// Create a store in `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>, file_name: impl Into<String>) -> Result<Self, LedgerError> {
        let dir = dir.as_ref().to_path_buf();
        let file_name = file_name.into();
        if file_name.is_empty() || file_name.starts_with('.') || file_name.contains(['/', '\\']) {
            return Err(LedgerError::Config(format!(
                "invalid store file name `{file_name}`"
            )));
        }
        if dir.exists() && !dir.is_dir() {
            return Err(LedgerError::Config(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        create_dir_all(&dir)
            .map_err(|e| LedgerError::Config(format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self {
            dir,
            file_name,
            closed: false,
        })
    }

    /// Path of the JSON document.
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Naming prefix shared by the document and its temp files.
    pub fn prefix(&self) -> &str {
        self.file_name
            .split('.')
            .next()
            .unwrap_or(self.file_name.as_str())
    }

    fn write_atomically(&self, tables: &LedgerTables, tmp: &Path) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(tmp)?;
        serde_json::to_writer_pretty(&mut file, tables)?;
        file.sync_all()?;
        fs::rename(tmp, self.file_path())?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&mut self) -> Result<LedgerTables, LedgerError> {
        let file_path = self.file_path();
        self.closed = false;
        if !file_path.exists() {
            return Ok(LedgerTables::default());
        }
        let data = fs::read(&file_path)?;
        serde_json::from_slice(&data)
            .map_err(|e| LedgerError::Corrupted(format!("{}: {e}", file_path.display())))
    }

    fn commit(&mut self, tables: &LedgerTables) -> Result<(), LedgerError> {
        if self.closed {
            return Err(LedgerError::Closed);
        }
        let tmp = self
            .dir
            .join(format!("{}.{}.tmp", self.file_name, Uuid::new_v4()));
        let result = self.write_atomically(tables, &tmp);
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn purge(&mut self) -> Result<(), LedgerError> {
        let prefix = self.prefix().to_string();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                debug!("removing {}", entry.path().display());
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), LedgerError> {
        self.closed = true;
        Ok(())
    }
}
