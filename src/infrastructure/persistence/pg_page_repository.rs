//! PostgreSQL implementation of the page repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use super::page_queries as queries;
use crate::domain::entities::PageRecord;
use crate::domain::repositories::PageRepository;
use crate::error::AppError;

pub struct PgPageRepository {
    pool: Arc<PgPool>,
}

impl PgPageRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageRepository for PgPageRepository {
    async fn find_record(&self, record_id: i64) -> Result<Option<PageRecord>, AppError> {
        queries::find_record(self.pool.as_ref(), record_id, false).await
    }

    async fn find_page(
        &self,
        page_id: i64,
        language_id: i64,
    ) -> Result<Option<PageRecord>, AppError> {
        queries::find_page(self.pool.as_ref(), page_id, language_id).await
    }

    async fn find_versions(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError> {
        queries::find_versions(self.pool.as_ref(), page_id).await
    }

    async fn find_children(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError> {
        queries::find_children(self.pool.as_ref(), page_id).await
    }

    async fn update_slug(&self, record_id: i64, slug: &str) -> Result<PageRecord, AppError> {
        queries::update_slug(self.pool.as_ref(), record_id, slug).await
    }
}
