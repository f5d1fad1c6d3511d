//! Interfaces the admission layer consumes from the surrounding scheduler.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Generic-information key declaring a job tree's node budget.
pub const MAX_NODES_USAGE: &str = "MAX_NODES_USAGE";

/// Generic-information key naming the job that spawned this one.
pub const PARENT_JOB_ID: &str = "PARENT_JOB_ID";

/// Lifecycle status of a task as reported by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Submitted, not yet eligible.
    Submitted,
    /// Eligible and waiting for nodes.
    Pending,
    /// Running on its nodes.
    Running,
    /// Paused by a user.
    Paused,
    /// Waiting for a retry after a failure.
    WaitingOnError,
    /// Finished successfully.
    Finished,
    /// Finished with an error.
    Faulty,
    /// Failed and will not be retried.
    Failed,
    /// Aborted by the scheduler.
    Aborted,
    /// Skipped by control flow.
    Skipped,
    /// Never started before its job ended.
    NotStarted,
}

impl TaskStatus {
    /// True while the task holds or is about to hold its nodes.
    pub const fn holds_nodes(self) -> bool {
        matches!(self, Self::Running | Self::Pending)
    }
}

/// Read-only view of a job handed to the ordering policy.
pub trait JobDescriptor {
    /// Job identifier.
    fn job_id(&self) -> &str;
    /// Free-form key/value information attached at submission.
    fn generic_information(&self) -> &HashMap<String, String>;
}

/// Task the base policy considers ready to run.
pub trait EligibleTask {
    /// Task identifier.
    fn task_id(&self) -> &str;
    /// Owning job identifier.
    fn job_id(&self) -> &str;
    /// Number of nodes the task needs while running.
    fn required_nodes(&self) -> u32;
}

/// Live scheduler state used to reconcile the ledger.
pub trait SchedulerState {
    /// True while the scheduler still manages `job_id`.
    fn is_job_alive(&self, job_id: &str) -> bool;
    /// Current status of `task_id`, `None` when the scheduler no longer knows it.
    fn task_status(&self, task_id: &str) -> Option<TaskStatus>;
}

/// Ordering policy deciding which eligible tasks the scheduler tries next.
pub trait OrderingPolicy {
    /// Job descriptor type consumed by the policy.
    type Job: JobDescriptor;
    /// Task type produced by the policy.
    type Task: EligibleTask;

    /// Drop jobs that must not be scheduled this pass.
    fn filter_jobs(&self, jobs: Vec<Self::Job>) -> Vec<Self::Job> {
        jobs
    }

    /// Eligible tasks of `jobs`, in the order they should be tried.
    fn ordered_tasks(&self, jobs: &[Self::Job]) -> Vec<Self::Task>;

    /// Filter then order in one scheduling pass.
    fn get_ordered_tasks(&self, jobs: Vec<Self::Job>) -> Vec<Self::Task> {
        let jobs = self.filter_jobs(jobs);
        self.ordered_tasks(&jobs)
    }

    /// Last-moment check once nodes were selected for `task`.
    fn is_task_executable(&self, _selected_nodes: &[String], _task: &Self::Task) -> bool {
        true
    }
}
