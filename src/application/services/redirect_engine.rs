//! Request-time redirect decision: match a rule, then resolve its target.

use axum::http::StatusCode;
use metrics::counter;
use url::Url;

use crate::application::services::redirect_matcher::RedirectMatcher;
use crate::application::services::target_resolver::{RequestContext, TargetResolver};
use crate::domain::entities::Redirect;

/// Status used when a stored rule carries a code that is not a redirect.
pub const FALLBACK_STATUS: StatusCode = StatusCode::TEMPORARY_REDIRECT;

/// A redirect ready to be answered.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRedirect {
    pub redirect: Redirect,
    pub location: Url,
    pub status: StatusCode,
}

pub struct RedirectEngine {
    matcher: RedirectMatcher,
    resolver: TargetResolver,
}

impl RedirectEngine {
    pub fn new(matcher: RedirectMatcher, resolver: TargetResolver) -> Self {
        Self { matcher, resolver }
    }

    /// Decides whether the request is redirected.
    ///
    /// Never fails: store errors and unresolvable targets are logged and
    /// reported as `None` so the request falls through to normal handling.
    /// A location equal to the request URL falls through as well.
    pub async fn evaluate(
        &self,
        host: &str,
        path: &str,
        query: &str,
        ctx: &RequestContext,
    ) -> Option<ResolvedRedirect> {
        let matched = match self.matcher.find_match(host, path, query).await {
            Ok(Some(matched)) => matched,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(host, path, error = %e, "Redirect lookup failed");
                counter!("redirects_fallthrough_total").increment(1);
                return None;
            }
        };

        let location = match self.resolver.resolve(&matched, ctx).await {
            Ok(Some(location)) => location,
            Ok(None) => {
                tracing::warn!(
                    redirect_id = matched.redirect.id,
                    target = %matched.redirect.target,
                    "Redirect target does not resolve, falling through"
                );
                counter!("redirects_fallthrough_total").increment(1);
                return None;
            }
            Err(e) => {
                tracing::error!(redirect_id = matched.redirect.id, error = %e, "Redirect target resolution failed");
                counter!("redirects_fallthrough_total").increment(1);
                return None;
            }
        };

        if location == ctx.uri {
            tracing::warn!(
                redirect_id = matched.redirect.id,
                location = %location,
                "Redirect points at the requested URL, falling through"
            );
            counter!("redirects_fallthrough_total").increment(1);
            return None;
        }

        let status = redirect_status(matched.redirect.status_code);
        tracing::debug!(
            redirect_id = matched.redirect.id,
            kind = ?matched.kind,
            status = status.as_u16(),
            location = %location,
            "Redirect matched"
        );
        counter!("redirects_matched_total").increment(1);

        Some(ResolvedRedirect {
            redirect: matched.redirect,
            location,
            status,
        })
    }
}

/// Maps a stored status code to a redirect status, 307 for anything else.
pub fn redirect_status(code: u16) -> StatusCode {
    match StatusCode::from_u16(code) {
        Ok(status) if status.is_redirection() => status,
        _ => FALLBACK_STATUS,
    }
}
