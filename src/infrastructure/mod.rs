//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and site configuration.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`memory`] - In-process store with the same contracts
//! - [`sites`] - Site topology file loader

pub mod memory;
pub mod persistence;
pub mod sites;
