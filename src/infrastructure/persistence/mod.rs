//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the domain repository traits using SQLx
//! runtime queries. The statements live in [`redirect_queries`] and
//! [`page_queries`] and are shared between pool-backed repositories and
//! rename transactions.
//!
//! # Repositories
//!
//! - [`PgRedirectRepository`] - Redirect rules, matching candidates, hit counters
//! - [`PgPageRepository`] - Page tree reads
//! - [`PgUnitOfWork`] - Transactions spanning both for slug renames

pub mod page_queries;
pub mod pg_page_repository;
pub mod pg_redirect_repository;
pub mod pg_unit_of_work;
pub mod redirect_queries;

pub use pg_page_repository::PgPageRepository;
pub use pg_redirect_repository::PgRedirectRepository;
pub use pg_unit_of_work::{PgRenameTransaction, PgUnitOfWork};
