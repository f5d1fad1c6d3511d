//! Per-pass view of the tokens left to each job tree.

use std::collections::HashMap;

/// Remaining node tokens per top-level job, taken from the ledger once per
/// scheduling pass and consumed by that pass only.
#[derive(Debug, Clone, Default)]
pub struct NodeUsageTokens {
    remaining: HashMap<String, u32>,
    ancestors: HashMap<String, String>,
}

impl NodeUsageTokens {
    /// Build a snapshot from remaining tokens and the flattened ancestor map.
    pub const fn new(remaining: HashMap<String, u32>, ancestors: HashMap<String, String>) -> Self {
        Self {
            remaining,
            ancestors,
        }
    }

    /// Job whose budget governs `job_id`; an untracked job governs itself.
    pub fn ancestor_of<'a>(&'a self, job_id: &'a str) -> &'a str {
        self.ancestors.get(job_id).map_or(job_id, String::as_str)
    }

    /// True when `job_id` belongs to a tree with a budget.
    pub fn is_tracked(&self, job_id: &str) -> bool {
        self.remaining.contains_key(self.ancestor_of(job_id))
    }

    /// Tokens left to the tree governing `job_id`, `None` when untracked.
    pub fn remaining(&self, job_id: &str) -> Option<u32> {
        self.remaining.get(self.ancestor_of(job_id)).copied()
    }

    /// Take `nodes` tokens from the tree governing `job_id`.
    ///
    /// Untracked jobs always succeed. A tracked tree with fewer than `nodes`
    /// tokens left is not modified and the call returns false.
    pub fn acquire_tokens(&mut self, job_id: &str, nodes: u32) -> bool {
        let ancestor = self.ancestors.get(job_id).map_or(job_id, String::as_str);
        match self.remaining.get_mut(ancestor) {
            None => true,
            Some(left) if *left >= nodes => {
                *left -= nodes;
                true
            }
            Some(_) => false,
        }
    }
}
