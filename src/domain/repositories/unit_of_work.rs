//! Transaction boundary for slug renames.

use async_trait::async_trait;

use super::{PageRepository, RedirectRepository};
use crate::error::AppError;

/// Repositories bound to one open transaction.
///
/// Dropping the transaction without calling [`RenameTransaction::commit`]
/// discards every write made through it.
#[async_trait]
pub trait RenameTransaction: RedirectRepository + PageRepository {
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

/// Opens rename transactions.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn RenameTransaction>, AppError>;
}
