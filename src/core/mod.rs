//! Core admission abstractions and token accounting.

pub mod audit;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod scheduling;
pub mod snapshot;

pub use audit::{AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, build_audit_event};
pub use error::{AppResult, LedgerError};
pub use ledger::{LedgerTables, TaskKey, TaskTokenRecord, TokenLedger, TokenStore, TreeUsage};
pub use policy::{BudgetDeclaration, NodeUsagePolicy};
pub use scheduling::{
    EligibleTask, JobDescriptor, MAX_NODES_USAGE, OrderingPolicy, PARENT_JOB_ID, SchedulerState,
    TaskStatus,
};
pub use snapshot::NodeUsageTokens;
