//! Infrastructure adapters for durable ledger storage.

pub mod store;
pub use store::FileTokenStore;
pub use store::InMemoryTokenStore;
