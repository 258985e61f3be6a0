//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`      - Health check: DB, hit queue, sites
//! - `/api/*`            - Redirect listing and page renames
//! - anything else       - JSON 404
//!
//! # Middleware
//!
//! - **Redirects** - Every request is matched against the redirect rules
//!   before it reaches a route
//! - **Tracing** - Structured request/response logging

use crate::api;
use crate::api::handlers::{fallback_handler, health_handler};
use crate::api::middleware::{redirect, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
///
/// The redirect layer wraps the fallback too, so a path without a route is
/// still redirected when a rule matches.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::routes::api_routes())
        .fallback(fallback_handler)
        .layer(middleware::from_fn_with_state(state.clone(), redirect::layer))
        .with_state(state)
        .layer(tracing::layer())
}
