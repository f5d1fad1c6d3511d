//! Scheduler fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use node_usage_admission::core::{
    EligibleTask, JobDescriptor, MAX_NODES_USAGE, OrderingPolicy, PARENT_JOB_ID, SchedulerState,
    TaskStatus,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub job_id: String,
    pub nodes: u32,
}

impl EligibleTask for Task {
    fn task_id(&self) -> &str {
        &self.id
    }

    fn job_id(&self) -> &str {
        &self.job_id
    }

    fn required_nodes(&self) -> u32 {
        self.nodes
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub info: HashMap<String, String>,
    pub tasks: Vec<Task>,
}

impl Job {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            info: HashMap::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_budget(mut self, value: &str) -> Self {
        self.info.insert(MAX_NODES_USAGE.to_string(), value.to_string());
        self
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.info.insert(PARENT_JOB_ID.to_string(), parent.to_string());
        self
    }

    /// Adds task `<job id>t<n>` needing `nodes` nodes.
    pub fn with_task(mut self, n: usize, nodes: u32) -> Self {
        self.tasks.push(Task {
            id: format!("{}t{}", self.id, n),
            job_id: self.id.clone(),
            nodes,
        });
        self
    }
}

impl JobDescriptor for Job {
    fn job_id(&self) -> &str {
        &self.id
    }

    fn generic_information(&self) -> &HashMap<String, String> {
        &self.info
    }
}

/// Base policy returning tasks job by job, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FifoPolicy {
    pub excluded_jobs: HashSet<String>,
}

impl OrderingPolicy for FifoPolicy {
    type Job = Job;
    type Task = Task;

    fn filter_jobs(&self, jobs: Vec<Job>) -> Vec<Job> {
        jobs.into_iter()
            .filter(|job| !self.excluded_jobs.contains(&job.id))
            .collect()
    }

    fn ordered_tasks(&self, jobs: &[Job]) -> Vec<Task> {
        jobs.iter().flat_map(|job| job.tasks.iter().cloned()).collect()
    }
}

#[derive(Default)]
struct LiveState {
    alive_jobs: HashSet<String>,
    statuses: HashMap<String, TaskStatus>,
}

/// Scheduler state the tests drive by hand. Clones share state.
#[derive(Clone, Default)]
pub struct FakeScheduler {
    state: Arc<Mutex<LiveState>>,
}

impl FakeScheduler {
    pub fn submit(&self, job_id: &str) {
        self.state.lock().alive_jobs.insert(job_id.to_string());
    }

    pub fn end_job(&self, job_id: &str) {
        self.state.lock().alive_jobs.remove(job_id);
    }

    pub fn set_status(&self, task_id: &str, status: TaskStatus) {
        self.state.lock().statuses.insert(task_id.to_string(), status);
    }

    pub fn forget_task(&self, task_id: &str) {
        self.state.lock().statuses.remove(task_id);
    }
}

impl SchedulerState for FakeScheduler {
    fn is_job_alive(&self, job_id: &str) -> bool {
        self.state.lock().alive_jobs.contains(job_id)
    }

    fn task_status(&self, task_id: &str) -> Option<TaskStatus> {
        self.state.lock().statuses.get(task_id).copied()
    }
}

pub fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}
