//! Durable, lock-guarded accounting of node usage per job tree.
//!
//! A job tree is a top-level job holding a node budget plus every descendant
//! job registered under it. Usage is never maintained incrementally: each
//! time a task starts or stops the tree's usage is recomputed by summing the
//! live task token records, so a missed start/stop notification heals on the
//! next recomputation.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::{LedgerError, NodeUsageTokens};

/// Nodes consumed by one running task, with its owning job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTokenRecord {
    /// Job owning the task.
    pub job_id: String,
    /// Number of nodes the task holds.
    pub nodes: u32,
}

/// Structured identity of a task tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    /// Owning job identifier.
    pub job_id: String,
    /// Task identifier.
    pub task_id: String,
}

/// Budget and current usage of a job tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeUsage {
    /// Maximum nodes the tree may hold concurrently.
    pub max_nodes: u32,
    /// Nodes currently held by running tasks of the tree.
    pub used_nodes: u32,
}

/// Persisted ledger state. Every table is keyed by plain identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerTables {
    /// Top-level job -> node budget.
    pub max_nodes: BTreeMap<String, u32>,
    /// Top-level job -> nodes in use.
    pub used_nodes: BTreeMap<String, u32>,
    /// Descendant job -> top-level ancestor.
    pub ancestors: BTreeMap<String, String>,
    /// Task -> token record.
    pub task_tokens: BTreeMap<String, TaskTokenRecord>,
    /// Top-level jobs terminated while descendants were still registered.
    pub pending_removal: BTreeSet<String>,
}

impl LedgerTables {
    /// Total number of entries across all tables.
    pub fn len(&self) -> usize {
        self.max_nodes.len()
            + self.used_nodes.len()
            + self.ancestors.len()
            + self.task_tokens.len()
            + self.pending_removal.len()
    }

    /// True when no table holds an entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Budget-holding ancestor governing `job_id`, if its tree is tracked.
    fn governing_ancestor(&self, job_id: &str) -> Option<String> {
        if self.max_nodes.contains_key(job_id) {
            return Some(job_id.to_string());
        }
        self.ancestors
            .get(job_id)
            .filter(|ancestor| self.max_nodes.contains_key(ancestor.as_str()))
            .cloned()
    }

    fn tree_of(&self, ancestor: &str) -> BTreeSet<String> {
        let mut tree: BTreeSet<String> = self
            .ancestors
            .iter()
            .filter(|(_, a)| a.as_str() == ancestor)
            .map(|(child, _)| child.clone())
            .collect();
        tree.insert(ancestor.to_string());
        tree
    }

    fn descendant_count(&self, ancestor: &str) -> usize {
        self.ancestors.values().filter(|a| a.as_str() == ancestor).count()
    }

    /// Rederive the usage of `ancestor`'s tree from the live task records.
    fn recompute_usage(&mut self, ancestor: &str) {
        if !self.max_nodes.contains_key(ancestor) {
            return;
        }
        let tree = self.tree_of(ancestor);
        let used: u64 = self
            .task_tokens
            .values()
            .filter(|record| tree.contains(&record.job_id))
            .map(|record| u64::from(record.nodes))
            .sum();
        let used = u32::try_from(used).unwrap_or(u32::MAX);
        self.used_nodes.insert(ancestor.to_string(), used);
    }

    fn remove_root(&mut self, ancestor: &str) {
        self.max_nodes.remove(ancestor);
        self.used_nodes.remove(ancestor);
        self.pending_removal.remove(ancestor);
        self.task_tokens.retain(|_, record| record.job_id != ancestor);
    }
}

/// Abstraction for durable key-value backends holding the ledger tables.
pub trait TokenStore: Send + Sync {
    /// Read the persisted tables; a missing store yields empty tables.
    fn load(&mut self) -> Result<LedgerTables, LedgerError>;
    /// Synchronously persist the full table set.
    fn commit(&mut self, tables: &LedgerTables) -> Result<(), LedgerError>;
    /// Destroy every persisted artifact so the next `load` starts empty.
    fn purge(&mut self) -> Result<(), LedgerError>;
    /// Release the store handle. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), LedgerError>;
}

struct LedgerInner {
    tables: LedgerTables,
    store: Box<dyn TokenStore>,
    closed: bool,
}

impl LedgerInner {
    fn commit(&mut self) {
        if self.closed {
            debug!("ledger closed, skipping commit");
            return;
        }
        if let Err(e) = self.store.commit(&self.tables) {
            warn!("failed to commit node usage ledger: {}", e);
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.store.close() {
            warn!("failed to close node usage store: {}", e);
        }
    }
}

/// Token ledger tracking budgets, ancestry and task consumption per job tree.
///
/// All state sits behind one `parking_lot::RwLock`: queries take the read
/// lock, mutations take the write lock and end with a synchronous commit to
/// the backing [`TokenStore`]. Commit failures are logged and swallowed; the
/// in-memory tables stay authoritative until the next successful commit.
pub struct TokenLedger {
    inner: RwLock<LedgerInner>,
}

impl TokenLedger {
    /// Open the ledger over `store`.
    ///
    /// A store that fails to load is assumed corrupt: it is purged and loaded
    /// once more. A second failure is fatal.
    pub fn open(mut store: Box<dyn TokenStore>) -> Result<Self, LedgerError> {
        let tables = match store.load() {
            Ok(tables) => tables,
            Err(first) => {
                warn!("node usage store unreadable ({}), recreating it", first);
                store.purge().map_err(|e| {
                    error!("failed to purge node usage store: {}", e);
                    LedgerError::Unrecoverable(e.to_string())
                })?;
                let tables = store.load().map_err(|e| {
                    error!("node usage store still unreadable after recreate: {}", e);
                    LedgerError::Unrecoverable(e.to_string())
                })?;
                info!("node usage store recreated");
                tables
            }
        };
        info!(
            trees = tables.max_nodes.len(),
            descendants = tables.ancestors.len(),
            tasks = tables.task_tokens.len(),
            "node usage ledger opened"
        );
        Ok(Self {
            inner: RwLock::new(LedgerInner {
                tables,
                store,
                closed: false,
            }),
        })
    }

    /// Register a top-level job holding a budget of `max_nodes`.
    /// Already registered jobs are left untouched.
    pub fn add_job(&self, job_id: &str, max_nodes: u32) {
        let mut inner = self.inner.write();
        if inner.tables.max_nodes.contains_key(job_id) {
            return;
        }
        inner.tables.max_nodes.insert(job_id.to_string(), max_nodes);
        inner.tables.used_nodes.insert(job_id.to_string(), 0);
        info!("job {} limited to {} nodes", job_id, max_nodes);
        inner.commit();
    }

    /// Register `job_id` under whichever ancestor governs `parent_job_id`.
    ///
    /// Ancestor chains are flattened: a grandchild maps straight to the
    /// top-level job. Untracked parents leave `job_id` untracked.
    pub fn add_child_job(&self, job_id: &str, parent_job_id: &str) {
        let mut inner = self.inner.write();
        let tables = &inner.tables;
        if tables.ancestors.contains_key(job_id) || tables.max_nodes.contains_key(job_id) {
            return;
        }
        let ancestor = if tables.max_nodes.contains_key(parent_job_id) {
            parent_job_id.to_string()
        } else if let Some(ancestor) = tables.ancestors.get(parent_job_id) {
            ancestor.clone()
        } else {
            return;
        };
        debug!("job {} joins the tree of {}", job_id, ancestor);
        inner.tables.ancestors.insert(job_id.to_string(), ancestor.clone());
        inner.tables.recompute_usage(&ancestor);
        inner.commit();
    }

    /// Record that `task_id` of `job_id` now holds `nodes` nodes.
    /// Ignored when the job's tree is not tracked.
    pub fn add_running_task(&self, job_id: &str, task_id: &str, nodes: u32) {
        let mut inner = self.inner.write();
        let Some(ancestor) = inner.tables.governing_ancestor(job_id) else {
            return;
        };
        inner.tables.task_tokens.insert(
            task_id.to_string(),
            TaskTokenRecord {
                job_id: job_id.to_string(),
                nodes,
            },
        );
        inner.tables.recompute_usage(&ancestor);
        debug!("task {} holds {} nodes of tree {}", task_id, nodes, ancestor);
        inner.commit();
    }

    /// Release the tokens held by `task_id`.
    pub fn task_not_running(&self, job_id: &str, task_id: &str) {
        let mut inner = self.inner.write();
        let Some(record) = inner.tables.task_tokens.remove(task_id) else {
            return;
        };
        let ancestor = inner
            .tables
            .governing_ancestor(job_id)
            .or_else(|| inner.tables.governing_ancestor(&record.job_id));
        if let Some(ancestor) = ancestor {
            inner.tables.recompute_usage(&ancestor);
        }
        debug!("task {} released {} nodes", task_id, record.nodes);
        inner.commit();
    }

    /// Drop `job_id` from the ledger.
    ///
    /// A top-level job with registered descendants is only marked for removal;
    /// its budget disappears once its last descendant terminates.
    pub fn job_terminated(&self, job_id: &str) {
        let mut inner = self.inner.write();
        let tables = &mut inner.tables;
        let ancestor = if tables.max_nodes.contains_key(job_id) {
            if tables.descendant_count(job_id) == 0 {
                tables.remove_root(job_id);
                info!("job tree {} removed", job_id);
            } else if tables.pending_removal.insert(job_id.to_string()) {
                debug!("job tree {} removal deferred until descendants end", job_id);
            }
            job_id.to_string()
        } else if let Some(ancestor) = tables.ancestors.remove(job_id) {
            tables.task_tokens.retain(|_, record| record.job_id != job_id);
            debug!("job {} left the tree of {}", job_id, ancestor);
            if tables.pending_removal.contains(&ancestor) && tables.descendant_count(&ancestor) == 0 {
                tables.remove_root(&ancestor);
                info!("job tree {} removed", ancestor);
            }
            ancestor
        } else {
            return;
        };
        tables.recompute_usage(&ancestor);
        inner.commit();
    }

    /// `ancestor_job_id` plus every descendant currently mapped to it.
    pub fn find_job_tree(&self, ancestor_job_id: &str) -> BTreeSet<String> {
        self.inner.read().tables.tree_of(ancestor_job_id)
    }

    /// Every job of every tracked tree.
    pub fn find_all_jobs_handled(&self) -> BTreeSet<String> {
        let inner = self.inner.read();
        inner
            .tables
            .max_nodes
            .keys()
            .flat_map(|ancestor| inner.tables.tree_of(ancestor))
            .collect()
    }

    /// Every task holding a token record.
    pub fn find_all_tasks_handled(&self) -> BTreeSet<TaskKey> {
        self.inner
            .read()
            .tables
            .task_tokens
            .iter()
            .map(|(task_id, record)| TaskKey {
                job_id: record.job_id.clone(),
                task_id: task_id.clone(),
            })
            .collect()
    }

    /// Top-level ancestor recorded for a descendant job.
    pub fn ancestor_job(&self, job_id: &str) -> Option<String> {
        self.inner.read().tables.ancestors.get(job_id).cloned()
    }

    /// Budget-holding job governing `job_id`: the job itself when it holds a
    /// budget, its ancestor when it is a registered descendant.
    pub fn governing_ancestor(&self, job_id: &str) -> Option<String> {
        self.inner.read().tables.governing_ancestor(job_id)
    }

    /// Budget and usage of a tracked tree.
    pub fn tree_usage(&self, ancestor_job_id: &str) -> Option<TreeUsage> {
        let inner = self.inner.read();
        let max_nodes = *inner.tables.max_nodes.get(ancestor_job_id)?;
        let used_nodes = inner.tables.used_nodes.get(ancestor_job_id).copied().unwrap_or(0);
        Some(TreeUsage {
            max_nodes,
            used_nodes,
        })
    }

    /// Build a fresh token snapshot from the current budgets and usage.
    pub fn node_usage_tokens(&self) -> NodeUsageTokens {
        let inner = self.inner.read();
        let tables = &inner.tables;
        let remaining: HashMap<String, u32> = tables
            .max_nodes
            .iter()
            .map(|(job, max)| {
                let used = tables.used_nodes.get(job).copied().unwrap_or(0);
                (job.clone(), max.saturating_sub(used))
            })
            .collect();
        let ancestors: HashMap<String, String> = tables
            .ancestors
            .iter()
            .map(|(child, ancestor)| (child.clone(), ancestor.clone()))
            .collect();
        NodeUsageTokens::new(remaining, ancestors)
    }

    /// Copy of the current tables.
    pub fn tables(&self) -> LedgerTables {
        self.inner.read().tables.clone()
    }

    /// Synchronously persist the current tables.
    pub fn commit(&self) {
        self.inner.write().commit();
    }

    /// Close the backing store. Safe to call more than once.
    pub fn close(&self) {
        self.inner.write().close();
    }
}

impl Drop for TokenLedger {
    fn drop(&mut self) {
        self.inner.get_mut().close();
    }
}
