//! In-memory token store backend.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{LedgerError, LedgerTables, TokenStore};

#[derive(Default)]
struct MemoryState {
    persisted: Option<LedgerTables>,
    commits: u64,
    closed: bool,
}

/// In-memory store for development and testing.
///
/// Clones share the same contents, so a ledger can be dropped and reopened
/// over a handle kept by the caller.
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables as of the last successful commit.
    pub fn persisted(&self) -> LedgerTables {
        self.state.lock().persisted.clone().unwrap_or_default()
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.state.lock().commits
    }

    /// True once the last ledger using this store closed it.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&mut self) -> Result<LedgerTables, LedgerError> {
        let mut state = self.state.lock();
        state.closed = false;
        Ok(state.persisted.clone().unwrap_or_default())
    }

    fn commit(&mut self, tables: &LedgerTables) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(LedgerError::Closed);
        }
        state.persisted = Some(tables.clone());
        state.commits += 1;
        Ok(())
    }

    fn purge(&mut self) -> Result<(), LedgerError> {
        self.state.lock().persisted = None;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LedgerError> {
        self.state.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_then_load() {
        let mut store = InMemoryTokenStore::new();
        let mut tables = LedgerTables::default();
        tables.max_nodes.insert("job1".into(), 3);

        store.commit(&tables).unwrap();
        assert_eq!(store.load().unwrap(), tables);
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn test_commit_after_close_fails() {
        let mut store = InMemoryTokenStore::new();
        store.close().unwrap();
        assert!(matches!(
            store.commit(&LedgerTables::default()),
            Err(LedgerError::Closed)
        ));
    }

    #[test]
    fn test_clones_share_contents() {
        let mut store = InMemoryTokenStore::new();
        let handle = store.clone();
        let mut tables = LedgerTables::default();
        tables.pending_removal.insert("job1".into());
        store.commit(&tables).unwrap();
        assert!(handle.persisted().pending_removal.contains("job1"));

        store.purge().unwrap();
        assert!(handle.persisted().is_empty());
    }
}
