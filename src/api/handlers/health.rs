//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::domain::repositories::RedirectFilter;
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Counts the stored redirect rules
/// 2. **Hit Queue**: Checks if channel is open and reports free capacity
/// 3. **Sites**: At least one site is configured
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected, 42 redirects" },
///     "hit_queue": { "status": "ok", "message": "Capacity: 10000/10000" },
///     "sites": { "status": "ok", "message": "2 site(s) configured" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let queue_check = check_hit_queue(&state);
    let sites_check = check_sites(&state);

    let all_healthy = db_check.is_ok() && queue_check.is_ok() && sites_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            hit_queue: queue_check,
            sites: sites_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    let filter = RedirectFilter {
        limit: 1,
        ..RedirectFilter::default()
    };
    match state.redirect_service.list(&filter).await {
        Ok((_, total)) => CheckStatus::ok(format!("Connected, {total} redirects")),
        Err(e) => CheckStatus::error(format!("Database error: {e}")),
    }
}

/// A disabled tracker has no worker behind it and is reported as such.
fn check_hit_queue(state: &AppState) -> CheckStatus {
    let tracker = &state.hit_tracker;
    if !tracker.is_enabled() {
        return CheckStatus::ok("Hit counting disabled");
    }
    if tracker.is_closed() {
        return CheckStatus::error("Hit queue is closed");
    }
    CheckStatus::ok(format!(
        "Capacity: {}/{}",
        tracker.queue_capacity(),
        tracker.queue_max_capacity()
    ))
}

fn check_sites(state: &AppState) -> CheckStatus {
    if state.sites.is_empty() {
        CheckStatus::error("No sites configured")
    } else {
        CheckStatus::ok(format!("{} site(s) configured", state.sites.sites().len()))
    }
}
