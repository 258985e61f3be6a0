//! API route configuration.
//!
//! The `/api` routes carry no authentication of their own; deployments put
//! them behind the CMS backend's authenticating proxy.

use crate::api::handlers::{redirect_detail_handler, redirect_list_handler, rename_page_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, put},
};

/// Administrative API routes.
///
/// # Endpoints
///
/// - `GET /redirects`                 - Filtered, paginated redirect listing
/// - `GET /redirects/{id}`            - A single redirect rule
/// - `PUT /pages/{record_id}/slug`    - Rename a page and create its redirects
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/redirects", get(redirect_list_handler))
        .route("/redirects/{id}", get(redirect_detail_handler))
        .route("/pages/{record_id}/slug", put(rename_page_handler))
}
