//! Repository trait for page tree access.

use async_trait::async_trait;

use crate::domain::entities::PageRecord;
use crate::error::AppError;

/// Read access to the page tree plus the slug write of a rename.
///
/// Soft-deleted records are invisible through every method.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Finds a record of any language by its own id.
    async fn find_record(&self, record_id: i64) -> Result<Option<PageRecord>, AppError>;

    /// Finds the version of page `page_id` in `language_id`.
    async fn find_page(
        &self,
        page_id: i64,
        language_id: i64,
    ) -> Result<Option<PageRecord>, AppError>;

    /// All language versions of a page, default language first.
    async fn find_versions(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError>;

    /// Default-language children of a page, ordered by `sorting` then id.
    async fn find_children(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError>;

    /// Writes a new slug segment to a record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist.
    async fn update_slug(&self, record_id: i64, slug: &str) -> Result<PageRecord, AppError>;
}
