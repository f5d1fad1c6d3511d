//! Token store backends.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::InMemoryTokenStore;
