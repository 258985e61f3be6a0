//! Handler for page slug renames.

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::dto::rename::{RenameRequest, RenameResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Changes the slug of a page record and creates the redirects for its old
/// URLs in the same transaction.
///
/// # Endpoint
///
/// `PUT /api/pages/{record_id}/slug`
///
/// # Request Body
///
/// ```json
/// { "slug": "test-new" }
/// ```
///
/// # Response
///
/// The updated page record, the correlation id shared by every redirect of
/// this rename, and the created, updated, skipped and removed redirects.
/// Renaming to the current slug changes nothing and returns no correlation id.
///
/// # Errors
///
/// - 400 Bad Request: invalid slug
/// - 404 Not Found: unknown page record
/// - 409 Conflict: a concurrent write claimed the same redirect source
pub async fn rename_page_handler(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    Json(payload): Json<RenameRequest>,
) -> Result<Json<RenameResponse>, AppError> {
    payload.validate()?;

    let result = state
        .slug_service
        .rename_page(record_id, &payload.slug)
        .await?;

    Ok(Json(result.into()))
}
