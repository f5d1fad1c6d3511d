//! Audit sink implementations.
//!
//! Records the admission decisions taken for each task.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::clock::now_ms;

/// Admission decision recorded for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Task kept in the ordered list.
    Admit,
    /// Task removed because its tree ran out of tokens.
    Reject,
    /// Task confirmed to start and charged to its tree.
    Start,
}

impl AuditAction {
    /// Lowercase name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admit => "admit",
            Self::Reject => "reject",
            Self::Start => "start",
        }
    }
}

/// Audit event structure.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier.
    pub task_id: String,
    /// Owning job identifier.
    pub job_id: String,
    /// Job whose budget governs the task.
    pub tree: String,
    /// Decision taken.
    pub action: AuditAction,
    /// Nodes requested by the task.
    pub nodes: u32,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Shared sink: callers keep a handle to inspect what was recorded.
impl<S: AuditSink> AuditSink for Arc<Mutex<S>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    task_id: impl Into<String>,
    job_id: impl Into<String>,
    tree: impl Into<String>,
    action: AuditAction,
    nodes: u32,
) -> AuditEvent {
    let task_id = task_id.into();
    let created_at_ms = now_ms();
    AuditEvent {
        event_id: format!("{task_id}-{}-{created_at_ms}", action.as_str()),
        task_id,
        job_id: job_id.into(),
        tree: tree.into(),
        action,
        nodes,
        created_at_ms,
    }
}
