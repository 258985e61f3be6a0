//! In-process repository implementations.

pub mod memory_store;

pub use memory_store::{InMemoryStore, MemoryState, MemoryTransaction};
