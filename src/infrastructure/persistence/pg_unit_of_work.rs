//! PostgreSQL transactions for slug renames.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{page_queries, redirect_queries};
use crate::domain::entities::{NewRedirect, PageRecord, Redirect, RedirectPatch};
use crate::domain::repositories::{
    PageRepository, RedirectFilter, RedirectRepository, RenameTransaction, UnitOfWork,
};
use crate::error::AppError;

/// Opens one database transaction per rename.
pub struct PgUnitOfWork {
    pool: Arc<PgPool>,
}

impl PgUnitOfWork {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn RenameTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgRenameTransaction { tx: Mutex::new(tx) }))
    }
}

/// Both repositories on one open transaction.
///
/// Page records read through [`PageRepository::find_record`] are locked
/// `FOR UPDATE`. Dropping without commit rolls back.
pub struct PgRenameTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

#[async_trait]
impl RenameTransaction for PgRenameTransaction {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }
}

#[async_trait]
impl RedirectRepository for PgRenameTransaction {
    async fn find_candidates(
        &self,
        host: &str,
        path: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Redirect>, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::find_candidates(&mut **tx, host, path, case_insensitive).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Redirect>, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::find_by_id(&mut **tx, id).await
    }

    async fn find_by_source(
        &self,
        host: &str,
        source_path: &str,
    ) -> Result<Vec<Redirect>, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::find_by_source(&mut **tx, host, source_path).await
    }

    async fn create(&self, new_redirect: NewRedirect) -> Result<Redirect, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::create(&mut **tx, new_redirect).await
    }

    async fn update(&self, id: i64, patch: RedirectPatch) -> Result<Redirect, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::update(&mut **tx, id, patch).await
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::soft_delete(&mut **tx, id).await
    }

    async fn increment_hit(&self, id: i64, hit_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::increment_hit(&mut **tx, id, hit_at).await
    }

    async fn list(&self, filter: &RedirectFilter) -> Result<Vec<Redirect>, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::list(&mut **tx, filter).await
    }

    async fn count(&self, filter: &RedirectFilter) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::count(&mut **tx, filter).await
    }

    async fn list_all(&self) -> Result<Vec<Redirect>, AppError> {
        let mut tx = self.tx.lock().await;
        redirect_queries::list_all(&mut **tx).await
    }
}

#[async_trait]
impl PageRepository for PgRenameTransaction {
    async fn find_record(&self, record_id: i64) -> Result<Option<PageRecord>, AppError> {
        let mut tx = self.tx.lock().await;
        page_queries::find_record(&mut **tx, record_id, true).await
    }

    async fn find_page(
        &self,
        page_id: i64,
        language_id: i64,
    ) -> Result<Option<PageRecord>, AppError> {
        let mut tx = self.tx.lock().await;
        page_queries::find_page(&mut **tx, page_id, language_id).await
    }

    async fn find_versions(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError> {
        let mut tx = self.tx.lock().await;
        page_queries::find_versions(&mut **tx, page_id).await
    }

    async fn find_children(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError> {
        let mut tx = self.tx.lock().await;
        page_queries::find_children(&mut **tx, page_id).await
    }

    async fn update_slug(&self, record_id: i64, slug: &str) -> Result<PageRecord, AppError> {
        let mut tx = self.tx.lock().await;
        page_queries::update_slug(&mut **tx, record_id, slug).await
    }
}
