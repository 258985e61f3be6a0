//! Redirect middleware answering requests that match a stored rule.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use url::Url;

use crate::application::services::RequestContext;
use crate::domain::entities::FrontendUser;
use crate::state::AppState;
use crate::utils::extract_host::extract_host;

pub static X_REDIRECT_BY: HeaderName = HeaderName::from_static("x-redirect-by");

/// Matches every request against the redirect rules before routing.
///
/// # Request Flow
///
/// 1. Take `host[:port]` from the `Host` header or the URI authority
/// 2. Match the site serving the request for URL building
/// 3. Ask the engine for a rule and a resolved target
/// 4. On a hit answer with the rule's status, `Location` and
///    `X-Redirect-By: <product> <rule id>`, then record the hit
/// 5. Otherwise hand the request to the inner service unchanged
///
/// The current frontend user is read from a [`FrontendUser`] request
/// extension when an upstream layer provides one.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/health", get(health_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), redirect::layer));
/// ```
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(host) = extract_host(req.headers(), req.uri()) else {
        return next.run(req).await;
    };
    let uri = req.uri().clone();
    let user = req.extensions().get::<FrontendUser>().cloned();

    match redirect_response(&state, &host, &uri, user).await {
        Some(response) => response,
        None => next.run(req).await,
    }
}

async fn redirect_response(
    state: &AppState,
    host: &str,
    uri: &Uri,
    user: Option<FrontendUser>,
) -> Option<Response> {
    let path = uri.path();
    let query = uri.query().unwrap_or_default();

    let site = state.sites.match_request(host, path);
    let scheme = uri
        .scheme_str()
        .or_else(|| site.as_ref().and_then(|m| m.base.scheme.as_deref()))
        .unwrap_or("http");

    let request_url = match Url::parse(&format!("{scheme}://{host}{path}")) {
        Ok(mut url) => {
            url.set_query((!query.is_empty()).then_some(query));
            url
        }
        Err(e) => {
            tracing::debug!(host, path, error = %e, "Request URL cannot be rebuilt, skipping redirects");
            return None;
        }
    };

    let ctx = RequestContext::new(request_url)
        .with_user(user)
        .with_site(site.map(|m| m.site.clone()));

    let resolved = state.engine.evaluate(host, path, query, &ctx).await?;

    let location = match HeaderValue::from_str(resolved.location.as_str()) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(redirect_id = resolved.redirect.id, error = %e, "Location is not a valid header value");
            return None;
        }
    };
    let redirect_by =
        HeaderValue::from_str(&format!("{} {}", state.redirect_by, resolved.redirect.id)).ok()?;

    state.hit_tracker.record_hit(&resolved.redirect);

    let mut response = resolved.status.into_response();
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, location);
    headers.insert(X_REDIRECT_BY.clone(), redirect_by);
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use crate::application::services::HitTracker;
    use crate::domain::entities::{
        ANY_HOST, NewRedirect, PageRecord, Site, SiteLanguage, SiteRedirectSettings,
    };
    use crate::domain::events::RedirectPersistHooks;
    use crate::domain::repositories::RedirectRepository;
    use crate::domain::site_finder::SiteFinder;
    use crate::infrastructure::memory::InMemoryStore;
    use crate::state::{RedirectSettings, Repositories};

    async fn app() -> Router {
        let mut members = PageRecord::new(2, Some(1), "members");
        members.access_groups = vec![7];
        let store = InMemoryStore::with_pages([PageRecord::new(1, None, ""), members]);
        store
            .create(NewRedirect::manual(ANY_HOST, "/old", "page://2"))
            .await
            .unwrap();

        let site = Site {
            identifier: "main".to_string(),
            root_page_id: 1,
            base: "https://www.example.com/".to_string(),
            languages: vec![SiteLanguage::implicit_default()],
            route_suffix: None,
            redirects: SiteRedirectSettings::default(),
        };
        let (tx, _rx) = mpsc::channel(10);
        let state = AppState::new(
            Repositories::in_memory(store),
            Arc::new(SiteFinder::new(vec![site])),
            HitTracker::new(false, tx),
            RedirectSettings {
                case_insensitive: false,
                redirect_by: "SlugRedirects".to_string(),
            },
            RedirectPersistHooks::new(),
        );

        Router::new()
            .route("/old", get(|| async { "inner" }))
            .layer(middleware::from_fn_with_state(state, layer))
    }

    fn request(user: Option<FrontendUser>) -> Request {
        let mut req = axum::http::Request::builder()
            .uri("/old")
            .header(header::HOST, "www.example.com")
            .body(Body::empty())
            .unwrap();
        if let Some(user) = user {
            req.extensions_mut().insert(user);
        }
        req
    }

    #[tokio::test]
    async fn test_restricted_target_needs_frontend_user() {
        let response = app().await.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::LOCATION).is_none());

        let member = FrontendUser {
            id: 1,
            groups: vec![7],
        };
        let response = app().await.oneshot(request(Some(member))).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://www.example.com/members"
        );
        assert_eq!(response.headers().get(&X_REDIRECT_BY).unwrap(), "SlugRedirects 1");
    }

    #[tokio::test]
    async fn test_request_without_host_passes_through() {
        let req = axum::http::Request::builder()
            .uri("/old")
            .body(Body::empty())
            .unwrap();
        let response = app().await.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
