//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access; implementations live in
//! `crate::infrastructure`. Mock implementations are generated via `mockall`
//! for unit tests.
//!
//! # Available Repositories
//!
//! - [`RedirectRepository`] - Redirect rule storage, matching candidates, hit counters
//! - [`PageRepository`] - Page tree reads and slug writes
//! - [`UnitOfWork`] - Opens a [`RenameTransaction`] spanning both

pub mod page_repository;
pub mod redirect_repository;
pub mod unit_of_work;

pub use page_repository::PageRepository;
pub use redirect_repository::{
    DEFAULT_FILTER_LIMIT, OrderDirection, RedirectFilter, RedirectOrderField, RedirectRepository,
};
pub use unit_of_work::{RenameTransaction, UnitOfWork};

#[cfg(test)]
pub use page_repository::MockPageRepository;
#[cfg(test)]
pub use redirect_repository::MockRedirectRepository;
