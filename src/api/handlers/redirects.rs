//! Handlers for the read-only redirect listing.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;

use crate::api::dto::pagination::PaginationMeta;
use crate::api::dto::redirect::{RedirectItem, RedirectListQuery, RedirectListResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Lists redirect rules.
///
/// # Endpoint
///
/// `GET /api/redirects`
///
/// # Query Parameters
///
/// - `page`, `page_size` (optional): 1-based page, default size 50, max 500
/// - `source_hosts`, `status_codes` (optional): comma separated lists
/// - `source_path`, `target` (optional): substring filters
/// - `max_hits` (optional): only rules with fewer hits
/// - `older_than` (optional): only rules not hit since (RFC3339)
/// - `creation_type`, `protected`, `integrity_status` (optional)
/// - `order_field`, `order_direction` (optional): default `source_host asc`
///
/// # Errors
///
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn redirect_list_handler(
    State(state): State<AppState>,
    Query(params): Query<RedirectListQuery>,
) -> Result<Json<RedirectListResponse>, AppError> {
    let (page, page_size) = params
        .pagination
        .validate_and_get_page()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let filter = params.into_filter(page, page_size);
    let (redirects, total_items) = state.redirect_service.list(&filter).await?;

    Ok(Json(RedirectListResponse {
        pagination: PaginationMeta::new(page, page_size, total_items),
        items: redirects.into_iter().map(RedirectItem::from).collect(),
    }))
}

/// `GET /api/redirects/{id}`
///
/// # Errors
///
/// Returns 404 Not Found for unknown or deleted rules.
pub async fn redirect_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RedirectItem>, AppError> {
    let redirect = state.redirect_service.get(id).await?;
    Ok(Json(redirect.into()))
}
