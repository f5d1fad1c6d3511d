//! # Node Usage Admission
//!
//! Admission control limiting how many compute nodes a job tree may use at
//! once inside a distributed job scheduler.
//!
//! A job tree is a top-level job declaring a `MAX_NODES_USAGE` budget in its
//! generic information, plus every job it spawns (linked through
//! `PARENT_JOB_ID`). The crate has two halves:
//!
//! - **[`TokenLedger`](core::TokenLedger)**: durable, `RwLock`-guarded
//!   bookkeeping of budgets, ancestry and per-task node consumption. Usage is
//!   always recomputed from the live task records, never counted up and down.
//! - **[`NodeUsagePolicy`](core::NodeUsagePolicy)**: a decorator over the
//!   scheduler's base [`OrderingPolicy`](core::OrderingPolicy). Each pass it
//!   registers jobs, reconciles the ledger with the live scheduler, takes a
//!   [`NodeUsageTokens`](core::NodeUsageTokens) snapshot and drops the tasks
//!   whose tree has run out of tokens.
//!
//! ```rust,ignore
//! use node_usage_admission::config::LedgerConfig;
//! use node_usage_admission::core::{NodeUsagePolicy, OrderingPolicy};
//!
//! let policy = NodeUsagePolicy::from_config(base, scheduler, &LedgerConfig::from_env()?)?;
//!
//! // every scheduling tick
//! let tasks = policy.get_ordered_tasks(job_descriptors);
//! for task in &tasks {
//!     // once nodes were selected for the task
//!     policy.is_task_executable(&nodes, task);
//! }
//!
//! policy.shutdown();
//! ```
//!
//! For complete scenarios, see `tests/admission_scenarios_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core admission abstractions and token accounting.
pub mod core;
/// Configuration models for the ledger store.
pub mod config;
/// Builders to construct ledger components from configuration.
pub mod builders;
/// Infrastructure adapters for durable ledger storage.
pub mod infra;
/// Shared utilities.
pub mod util;
