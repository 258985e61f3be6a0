//! SQL for the `redirects` table.
//!
//! Every function takes any PostgreSQL executor so the same statements run on
//! the pool and inside a rename transaction.

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder};

use crate::domain::entities::{
    CreationType, IntegrityStatus, NewRedirect, Redirect, RedirectPatch,
};
use crate::domain::repositories::{OrderDirection, RedirectFilter};
use crate::error::AppError;

const COLUMNS: &str = "id, source_host, source_path, is_regex, respect_query, target, \
    status_code, disabled, disable_hitcount, protected, hit_count, last_hit_at, \
    creation_type, integrity_status, starts_at, ends_at, correlation_id, \
    created_at, updated_at, deleted_at";

#[derive(Debug, FromRow)]
struct RedirectRow {
    id: i64,
    source_host: String,
    source_path: String,
    is_regex: bool,
    respect_query: bool,
    target: String,
    status_code: i32,
    disabled: bool,
    disable_hitcount: bool,
    protected: bool,
    hit_count: i64,
    last_hit_at: Option<DateTime<Utc>>,
    creation_type: i16,
    integrity_status: String,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    correlation_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<RedirectRow> for Redirect {
    fn from(row: RedirectRow) -> Self {
        Self {
            id: row.id,
            source_host: row.source_host,
            source_path: row.source_path,
            is_regex: row.is_regex,
            respect_query: row.respect_query,
            target: row.target,
            // Out-of-range codes surface as 0 and are answered with the
            // fallback redirect status.
            status_code: u16::try_from(row.status_code).unwrap_or_default(),
            disabled: row.disabled,
            disable_hitcount: row.disable_hitcount,
            protected: row.protected,
            hit_count: row.hit_count,
            last_hit_at: row.last_hit_at,
            creation_type: CreationType::from_i16(row.creation_type),
            integrity_status: IntegrityStatus::parse(&row.integrity_status),
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            correlation_id: row.correlation_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Literal source path as compared against request paths.
const LITERAL_PATH: &str =
    "rtrim(CASE WHEN respect_query THEN split_part(source_path, '?', 1) ELSE source_path END, '/')";

pub async fn find_candidates<'e, E>(
    executor: E,
    host: &str,
    path: &str,
    case_insensitive: bool,
) -> Result<Vec<Redirect>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {COLUMNS}
        FROM redirects
        WHERE deleted_at IS NULL
          AND NOT disabled
          AND (source_host = '*' OR lower(source_host) = lower($1))
          AND (
              is_regex
              OR {LITERAL_PATH} = rtrim($2, '/')
              OR ($3 AND lower({LITERAL_PATH}) = lower(rtrim($2, '/')))
          )
        ORDER BY id
        "#
    );

    let rows = sqlx::query_as::<_, RedirectRow>(&sql)
        .bind(host)
        .bind(path)
        .bind(case_insensitive)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(Redirect::from).collect())
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Redirect>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {COLUMNS} FROM redirects WHERE id = $1 AND deleted_at IS NULL");
    let row = sqlx::query_as::<_, RedirectRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(Redirect::from))
}

pub async fn find_by_source<'e, E>(
    executor: E,
    host: &str,
    source_path: &str,
) -> Result<Vec<Redirect>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {COLUMNS}
        FROM redirects
        WHERE deleted_at IS NULL
          AND NOT is_regex
          AND source_host = $1
          AND source_path = $2
        ORDER BY id
        "#
    );
    let rows = sqlx::query_as::<_, RedirectRow>(&sql)
        .bind(host)
        .bind(source_path)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(Redirect::from).collect())
}

pub async fn create<'e, E>(executor: E, new_redirect: NewRedirect) -> Result<Redirect, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO redirects (
            source_host, source_path, is_regex, respect_query, target, status_code,
            disable_hitcount, protected, creation_type, starts_at, ends_at, correlation_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, RedirectRow>(&sql)
        .bind(new_redirect.source_host)
        .bind(new_redirect.source_path)
        .bind(new_redirect.is_regex)
        .bind(new_redirect.respect_query)
        .bind(new_redirect.target)
        .bind(i32::from(new_redirect.status_code))
        .bind(new_redirect.disable_hitcount)
        .bind(new_redirect.protected)
        .bind(new_redirect.creation_type.as_i16())
        .bind(new_redirect.starts_at)
        .bind(new_redirect.ends_at)
        .bind(new_redirect.correlation_id)
        .fetch_one(executor)
        .await?;

    Ok(row.into())
}

pub async fn update<'e, E>(executor: E, id: i64, patch: RedirectPatch) -> Result<Redirect, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        UPDATE redirects
        SET target = COALESCE($2, target),
            status_code = COALESCE($3, status_code),
            disabled = COALESCE($4, disabled),
            integrity_status = COALESCE($5, integrity_status),
            correlation_id = COALESCE($6, correlation_id),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, RedirectRow>(&sql)
        .bind(id)
        .bind(patch.target)
        .bind(patch.status_code.map(i32::from))
        .bind(patch.disabled)
        .bind(patch.integrity_status.map(|s| s.as_str().to_string()))
        .bind(patch.correlation_id)
        .fetch_optional(executor)
        .await?;

    row.map(Redirect::from)
        .ok_or_else(|| AppError::not_found("Redirect not found", json!({ "id": id })))
}

pub async fn soft_delete<'e, E>(executor: E, id: i64) -> Result<bool, AppError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE redirects SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn increment_hit<'e, E>(executor: E, id: i64, hit_at: DateTime<Utc>) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE redirects
        SET hit_count = hit_count + 1,
            last_hit_at = GREATEST(COALESCE(last_hit_at, $2), $2)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(hit_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn list<'e, E>(executor: E, filter: &RedirectFilter) -> Result<Vec<Redirect>, AppError>
where
    E: PgExecutor<'e>,
{
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM redirects"));
    push_filters(&mut builder, filter);

    let nulls = match filter.order_direction {
        OrderDirection::Asc => "NULLS FIRST",
        OrderDirection::Desc => "NULLS LAST",
    };
    builder.push(format!(
        " ORDER BY {} {} {nulls}, source_host ASC, id ASC",
        filter.order_field.column(),
        filter.order_direction.keyword()
    ));
    builder.push(" LIMIT ");
    builder.push_bind(i64::from(filter.limit));
    builder.push(" OFFSET ");
    builder.push_bind(filter.offset());

    let rows = builder
        .build_query_as::<RedirectRow>()
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(Redirect::from).collect())
}

pub async fn count<'e, E>(executor: E, filter: &RedirectFilter) -> Result<i64, AppError>
where
    E: PgExecutor<'e>,
{
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM redirects");
    push_filters(&mut builder, filter);

    let count = builder
        .build_query_scalar::<i64>()
        .fetch_one(executor)
        .await?;
    Ok(count)
}

pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Redirect>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {COLUMNS} FROM redirects WHERE deleted_at IS NULL ORDER BY id");
    let rows = sqlx::query_as::<_, RedirectRow>(&sql)
        .fetch_all(executor)
        .await?;

    Ok(rows.into_iter().map(Redirect::from).collect())
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &RedirectFilter) {
    builder.push(" WHERE deleted_at IS NULL");

    if !filter.source_hosts.is_empty() {
        builder.push(" AND source_host = ANY(");
        builder.push_bind(filter.source_hosts.clone());
        builder.push(")");
    }
    if let Some(path) = &filter.source_path {
        builder.push(" AND strpos(source_path, ");
        builder.push_bind(path.clone());
        builder.push(") > 0");
    }
    if let Some(target) = &filter.target {
        builder.push(" AND strpos(target, ");
        builder.push_bind(target.clone());
        builder.push(") > 0");
    }
    if !filter.status_codes.is_empty() {
        let codes: Vec<i32> = filter.status_codes.iter().copied().map(i32::from).collect();
        builder.push(" AND status_code = ANY(");
        builder.push_bind(codes);
        builder.push(")");
    }
    if let Some(max_hits) = filter.max_hits {
        builder.push(" AND hit_count < ");
        builder.push_bind(max_hits);
    }
    if let Some(older_than) = filter.older_than {
        builder.push(" AND COALESCE(last_hit_at, created_at) < ");
        builder.push_bind(older_than);
    }
    if let Some(creation_type) = filter.creation_type {
        builder.push(" AND creation_type = ");
        builder.push_bind(creation_type.as_i16());
    }
    if let Some(protected) = filter.protected {
        builder.push(" AND protected = ");
        builder.push_bind(protected);
    }
    if let Some(status) = filter.integrity_status {
        builder.push(" AND integrity_status = ");
        builder.push_bind(status.as_str().to_string());
    }
}
