//! Expansion of a matched rule's target into a concrete URL.

use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::application::services::page_router::PageRouter;
use crate::application::services::redirect_matcher::{MatchedRedirect, apply_captures};
use crate::domain::entities::{FrontendUser, RedirectTarget, Site};
use crate::domain::repositories::PageRepository;
use crate::error::AppError;
use crate::utils::query_string::{encode_query, merge_query};

/// Per-request inputs of target resolution.
///
/// Built once per request by the HTTP layer and passed down explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Absolute URL of the current request.
    pub uri: Url,
    pub query_params: Vec<(String, String)>,
    pub user: Option<FrontendUser>,
    /// Site answering the request. Pages of other sites never borrow the
    /// request's scheme and host.
    pub site: Option<Site>,
}

impl RequestContext {
    pub fn new(uri: Url) -> Self {
        let query_params = uri.query_pairs().into_owned().collect();
        Self {
            uri,
            query_params,
            user: None,
            site: None,
        }
    }

    pub fn with_user(mut self, user: Option<FrontendUser>) -> Self {
        self.user = user;
        self
    }

    pub fn with_site(mut self, site: Option<Site>) -> Self {
        self.site = site;
        self
    }

    fn user_groups(&self) -> &[i64] {
        match &self.user {
            Some(user) => &user.groups,
            None => &[],
        }
    }
}

pub struct TargetResolver {
    pages: Arc<dyn PageRepository>,
    router: PageRouter,
}

impl TargetResolver {
    pub fn new(pages: Arc<dyn PageRepository>, router: PageRouter) -> Self {
        Self { pages, router }
    }

    /// Resolves the target of a matched rule.
    ///
    /// Regex captures are substituted first. Returns `Ok(None)` when the
    /// stored target is malformed or an internal target does not resolve.
    ///
    /// # Errors
    ///
    /// Propagates repository errors.
    pub async fn resolve(
        &self,
        matched: &MatchedRedirect,
        ctx: &RequestContext,
    ) -> Result<Option<Url>, AppError> {
        let raw = apply_captures(&matched.redirect.target, &matched.captures);
        let target = match RedirectTarget::parse(&raw) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(
                    redirect_id = matched.redirect.id,
                    target = %raw,
                    error = %e,
                    "Redirect target cannot be decoded"
                );
                return Ok(None);
            }
        };

        self.resolve_target(&target, ctx).await
    }

    /// Resolves a decoded target against the request.
    ///
    /// The request's query parameters are carried over; parameters defined by
    /// the target replace request parameters with the same key.
    pub async fn resolve_target(
        &self,
        target: &RedirectTarget,
        ctx: &RequestContext,
    ) -> Result<Option<Url>, AppError> {
        let (mut url, overrides): (Url, Vec<(String, String)>) = match target {
            RedirectTarget::External(url) => (url.clone(), url.query_pairs().into_owned().collect()),
            RedirectTarget::Relative(reference) => match ctx.uri.join(reference) {
                Ok(url) => {
                    let params = url.query_pairs().into_owned().collect();
                    (url, params)
                }
                Err(e) => {
                    tracing::warn!(target = %reference, error = %e, "Relative target cannot be joined");
                    return Ok(None);
                }
            },
            RedirectTarget::Internal(internal) => {
                let resolved = self
                    .router
                    .resolve_page(
                        self.pages.as_ref(),
                        internal.page_id,
                        internal.language_id,
                        Utc::now(),
                    )
                    .await?;
                let Some(resolved) = resolved else {
                    tracing::debug!(
                        page_id = internal.page_id,
                        language_id = internal.language_id,
                        site = ctx.site.as_ref().map(|s| s.identifier.as_str()),
                        "Internal target is not routable"
                    );
                    return Ok(None);
                };
                if !resolved.is_accessible_for(ctx.user_groups()) {
                    tracing::debug!(page_id = internal.page_id, "Internal target not accessible for visitor");
                    return Ok(None);
                }
                let fallback = match &ctx.site {
                    Some(site) if site.identifier != resolved.site.identifier => None,
                    _ => Some(&ctx.uri),
                };
                let Some(url) = resolved.url(fallback) else {
                    tracing::debug!(
                        page_id = internal.page_id,
                        site = %resolved.site.identifier,
                        "Internal target of a host-less site outside the request's site"
                    );
                    return Ok(None);
                };
                (url, internal.parameters.clone())
            }
        };

        let merged = merge_query(&ctx.query_params, &overrides);
        if merged.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&encode_query(&merged)));
        }
        Ok(Some(url))
    }
}
