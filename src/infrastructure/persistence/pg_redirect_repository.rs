//! PostgreSQL implementation of the redirect repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use super::redirect_queries as queries;
use crate::domain::entities::{NewRedirect, Redirect, RedirectPatch};
use crate::domain::repositories::{RedirectFilter, RedirectRepository};
use crate::error::AppError;

/// PostgreSQL repository for redirect rules.
///
/// Statements run directly on the pool; see
/// [`super::PgUnitOfWork`] for the transactional variant used by renames.
pub struct PgRedirectRepository {
    pool: Arc<PgPool>,
}

impl PgRedirectRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedirectRepository for PgRedirectRepository {
    async fn find_candidates(
        &self,
        host: &str,
        path: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Redirect>, AppError> {
        queries::find_candidates(self.pool.as_ref(), host, path, case_insensitive).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Redirect>, AppError> {
        queries::find_by_id(self.pool.as_ref(), id).await
    }

    async fn find_by_source(
        &self,
        host: &str,
        source_path: &str,
    ) -> Result<Vec<Redirect>, AppError> {
        queries::find_by_source(self.pool.as_ref(), host, source_path).await
    }

    async fn create(&self, new_redirect: NewRedirect) -> Result<Redirect, AppError> {
        queries::create(self.pool.as_ref(), new_redirect).await
    }

    async fn update(&self, id: i64, patch: RedirectPatch) -> Result<Redirect, AppError> {
        queries::update(self.pool.as_ref(), id, patch).await
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        queries::soft_delete(self.pool.as_ref(), id).await
    }

    async fn increment_hit(&self, id: i64, hit_at: DateTime<Utc>) -> Result<(), AppError> {
        queries::increment_hit(self.pool.as_ref(), id, hit_at).await
    }

    async fn list(&self, filter: &RedirectFilter) -> Result<Vec<Redirect>, AppError> {
        queries::list(self.pool.as_ref(), filter).await
    }

    async fn count(&self, filter: &RedirectFilter) -> Result<i64, AppError> {
        queries::count(self.pool.as_ref(), filter).await
    }

    async fn list_all(&self) -> Result<Vec<Redirect>, AppError> {
        queries::list_all(self.pool.as_ref()).await
    }
}
