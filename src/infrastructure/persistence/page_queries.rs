//! SQL for the `pages` table.
//!
//! Translations are joined with their default-language row, which owns the
//! tree position and the shared page id.

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgExecutor};

use crate::domain::entities::{PageRecord, PageType};
use crate::error::AppError;

const COLUMNS: &str = "p.id, COALESCE(p.translation_of, p.id) AS page_id, d.parent_id, \
    p.language_id, p.slug, p.title, p.page_type, p.hidden, p.extend_to_subpages, \
    p.starts_at, p.ends_at, p.access_groups, p.sorting";

const JOIN_DEFAULT: &str = "JOIN pages d ON d.id = COALESCE(p.translation_of, p.id) \
    AND d.deleted_at IS NULL";

#[derive(Debug, FromRow)]
struct PageRow {
    id: i64,
    page_id: i64,
    parent_id: Option<i64>,
    language_id: i64,
    slug: String,
    title: String,
    page_type: i16,
    hidden: bool,
    extend_to_subpages: bool,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    access_groups: Vec<i64>,
    sorting: i32,
}

impl From<PageRow> for PageRecord {
    fn from(row: PageRow) -> Self {
        Self {
            id: row.id,
            page_id: row.page_id,
            parent_id: row.parent_id,
            language_id: row.language_id,
            slug: row.slug,
            title: row.title,
            page_type: PageType::from_i16(row.page_type),
            hidden: row.hidden,
            extend_to_subpages: row.extend_to_subpages,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            access_groups: row.access_groups,
            sorting: row.sorting,
        }
    }
}

/// Loads one record. With `lock` the row is locked until the surrounding
/// transaction ends, which serializes concurrent renames of the same record.
pub async fn find_record<'e, E>(
    executor: E,
    record_id: i64,
    lock: bool,
) -> Result<Option<PageRecord>, AppError>
where
    E: PgExecutor<'e>,
{
    let lock_clause = if lock { "FOR UPDATE OF p" } else { "" };
    let sql = format!(
        "SELECT {COLUMNS} FROM pages p {JOIN_DEFAULT} \
         WHERE p.id = $1 AND p.deleted_at IS NULL {lock_clause}"
    );
    let row = sqlx::query_as::<_, PageRow>(&sql)
        .bind(record_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(PageRecord::from))
}

pub async fn find_page<'e, E>(
    executor: E,
    page_id: i64,
    language_id: i64,
) -> Result<Option<PageRecord>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM pages p {JOIN_DEFAULT} \
         WHERE COALESCE(p.translation_of, p.id) = $1 AND p.language_id = $2 \
           AND p.deleted_at IS NULL"
    );
    let row = sqlx::query_as::<_, PageRow>(&sql)
        .bind(page_id)
        .bind(language_id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(PageRecord::from))
}

pub async fn find_versions<'e, E>(executor: E, page_id: i64) -> Result<Vec<PageRecord>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM pages p {JOIN_DEFAULT} \
         WHERE COALESCE(p.translation_of, p.id) = $1 AND p.deleted_at IS NULL \
         ORDER BY p.language_id"
    );
    let rows = sqlx::query_as::<_, PageRow>(&sql)
        .bind(page_id)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(PageRecord::from).collect())
}

pub async fn find_children<'e, E>(executor: E, page_id: i64) -> Result<Vec<PageRecord>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM pages p {JOIN_DEFAULT} \
         WHERE p.translation_of IS NULL AND p.parent_id = $1 AND p.deleted_at IS NULL \
         ORDER BY p.sorting, p.id"
    );
    let rows = sqlx::query_as::<_, PageRow>(&sql)
        .bind(page_id)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(PageRecord::from).collect())
}

pub async fn update_slug<'e, E>(executor: E, record_id: i64, slug: &str) -> Result<PageRecord, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        WITH p AS (
            UPDATE pages
            SET slug = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
        )
        SELECT {COLUMNS} FROM p {JOIN_DEFAULT}
        "#
    );
    let row = sqlx::query_as::<_, PageRow>(&sql)
        .bind(record_id)
        .bind(slug)
        .fetch_optional(executor)
        .await?;

    row.map(PageRecord::from)
        .ok_or_else(|| AppError::not_found("Page not found", json!({ "record_id": record_id })))
}
