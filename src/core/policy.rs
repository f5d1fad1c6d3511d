//! Node-usage admission policy layered over a base ordering policy.
//!
//! Each scheduling pass the policy registers the jobs it sees with the
//! [`TokenLedger`], lets the base policy order the eligible tasks, reconciles
//! the ledger with the live scheduler, then walks the ordered list and keeps
//! only the tasks whose job tree still has enough node tokens. Order is kept;
//! tasks are only removed.

use std::collections::HashMap;
use std::num::IntErrorKind;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::builders::build_ledger;
use crate::config::LedgerConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::scheduling::{
    EligibleTask, JobDescriptor, OrderingPolicy, SchedulerState, MAX_NODES_USAGE, PARENT_JOB_ID,
};
use crate::core::{LedgerError, NodeUsageTokens, TokenLedger};

/// Node budget a job declares through its generic information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDeclaration {
    /// No usable `MAX_NODES_USAGE` value.
    Absent,
    /// Zero or negative value: the job stays out of any tree.
    OptOut,
    /// Positive budget: the job heads its own tree.
    Limit(u32),
}

impl BudgetDeclaration {
    /// Read the declaration of `job_id` from its generic information.
    ///
    /// A value that is not an integer is logged and treated as absent.
    pub fn from_generic_information(job_id: &str, info: &HashMap<String, String>) -> Self {
        let Some(raw) = info.get(MAX_NODES_USAGE) else {
            return Self::Absent;
        };
        match raw.trim().parse::<i64>() {
            Ok(n) if n > 0 => Self::Limit(u32::try_from(n).unwrap_or(u32::MAX)),
            Ok(_) => Self::OptOut,
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Self::Limit(u32::MAX),
            Err(e) if *e.kind() == IntErrorKind::NegOverflow => Self::OptOut,
            Err(e) => {
                error!(
                    "job {} declares an invalid {} value {:?}: {}",
                    job_id, MAX_NODES_USAGE, raw, e
                );
                Self::Absent
            }
        }
    }
}

/// Admission policy limiting the nodes used concurrently by each job tree.
pub struct NodeUsagePolicy<P, S> {
    base: P,
    scheduler: S,
    ledger: TokenLedger,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

impl<P, S> NodeUsagePolicy<P, S>
where
    P: OrderingPolicy,
    S: SchedulerState,
{
    /// Wrap `base`, accounting usage in `ledger`.
    pub fn new(base: P, scheduler: S, ledger: TokenLedger) -> Self {
        Self {
            base,
            scheduler,
            ledger,
            audit: None,
        }
    }

    /// Wrap `base` with a ledger built from configuration.
    pub fn from_config(base: P, scheduler: S, cfg: &LedgerConfig) -> Result<Self, LedgerError> {
        let ledger = build_ledger(cfg)?;
        Ok(Self::new(base, scheduler, ledger))
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Mutex::new(audit));
        self
    }

    /// Wrapped base policy.
    pub const fn base(&self) -> &P {
        &self.base
    }

    /// Ledger owned by this policy.
    pub const fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    /// Close the ledger's store.
    pub fn shutdown(&self) {
        self.ledger.close();
    }

    fn register_job(&self, job: &P::Job) {
        let job_id = job.job_id();
        let info = job.generic_information();
        match BudgetDeclaration::from_generic_information(job_id, info) {
            BudgetDeclaration::Limit(max_nodes) => self.ledger.add_job(job_id, max_nodes),
            BudgetDeclaration::OptOut => {
                debug!("job {} opted out of node usage limits", job_id);
            }
            BudgetDeclaration::Absent => {
                if let Some(parent) = info.get(PARENT_JOB_ID).filter(|p| !p.is_empty()) {
                    self.ledger.add_child_job(job_id, parent);
                }
            }
        }
    }

    /// Drop ledger entries for tasks and jobs the scheduler no longer runs.
    pub fn reconcile(&self) {
        for task in self.ledger.find_all_tasks_handled() {
            let live = self
                .scheduler
                .task_status(&task.task_id)
                .is_some_and(|status| status.holds_nodes());
            if !live {
                self.ledger.task_not_running(&task.job_id, &task.task_id);
            }
        }
        self.ledger.commit();

        for job_id in self.ledger.find_all_jobs_handled() {
            if !self.scheduler.is_job_alive(&job_id) {
                self.ledger.job_terminated(&job_id);
            }
        }
        self.ledger.commit();
    }

    fn admit(&self, tokens: &mut NodeUsageTokens, task: &P::Task) -> bool {
        let nodes = task.required_nodes();
        let acquired = tokens.acquire_tokens(task.job_id(), nodes);
        if tokens.is_tracked(task.job_id()) {
            let tree = tokens.ancestor_of(task.job_id()).to_string();
            if !acquired {
                debug!(
                    "task {} needs {} nodes, tree {} has {} left",
                    task.task_id(),
                    nodes,
                    tree,
                    tokens.remaining(&tree).unwrap_or(0)
                );
            }
            let action = if acquired {
                AuditAction::Admit
            } else {
                AuditAction::Reject
            };
            self.record_audit(task, &tree, action);
        }
        acquired
    }

    fn record_audit(&self, task: &P::Task, tree: &str, action: AuditAction) {
        if let Some(audit) = &self.audit {
            audit.lock().record(build_audit_event(
                task.task_id(),
                task.job_id(),
                tree,
                action,
                task.required_nodes(),
            ));
        }
    }
}

impl<P, S> OrderingPolicy for NodeUsagePolicy<P, S>
where
    P: OrderingPolicy,
    S: SchedulerState,
{
    type Job = P::Job;
    type Task = P::Task;

    /// Base filtering, then registration of every surviving job with the
    /// ledger. Registration never drops a job.
    fn filter_jobs(&self, jobs: Vec<Self::Job>) -> Vec<Self::Job> {
        let jobs = self.base.filter_jobs(jobs);
        for job in &jobs {
            self.register_job(job);
        }
        jobs
    }

    fn ordered_tasks(&self, jobs: &[Self::Job]) -> Vec<Self::Task> {
        let ordered = self.base.ordered_tasks(jobs);
        self.reconcile();

        let mut tokens = self.ledger.node_usage_tokens();
        let offered = ordered.len();
        let admitted: Vec<Self::Task> = ordered
            .into_iter()
            .filter(|task| self.admit(&mut tokens, task))
            .collect();
        debug!("admitted {} of {} eligible tasks", admitted.len(), offered);
        admitted
    }

    /// Charges the task's nodes to its tree. Rejection already happened while
    /// ordering, so this always returns true.
    fn is_task_executable(&self, _selected_nodes: &[String], task: &Self::Task) -> bool {
        self.ledger
            .add_running_task(task.job_id(), task.task_id(), task.required_nodes());
        if let Some(tree) = self.ledger.governing_ancestor(task.job_id()) {
            self.record_audit(task, &tree, AuditAction::Start);
        }
        true
    }
}
