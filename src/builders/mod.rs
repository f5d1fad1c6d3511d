//! Builders to construct ledger components from configuration.

pub mod ledger_builder;

pub use ledger_builder::{build_ledger, build_store};
