//! Derives and stores whether redirect targets still resolve.

use std::sync::Arc;

use chrono::Utc;

use crate::application::services::page_router::PageRouter;
use crate::domain::entities::{IntegrityStatus, Redirect, RedirectPatch, RedirectTarget};
use crate::domain::repositories::{PageRepository, RedirectRepository};
use crate::error::AppError;

/// Totals of one integrity pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub checked: usize,
    pub changed: usize,
    pub broken: usize,
}

pub struct IntegrityService {
    redirects: Arc<dyn RedirectRepository>,
    pages: Arc<dyn PageRepository>,
    router: PageRouter,
}

impl IntegrityService {
    pub fn new(
        redirects: Arc<dyn RedirectRepository>,
        pages: Arc<dyn PageRepository>,
        router: PageRouter,
    ) -> Self {
        Self {
            redirects,
            pages,
            router,
        }
    }

    /// `Ok` for a resolvable internal target, `Broken` for a missing or
    /// unroutable page or an undecodable target, `Unknown` for URLs that are
    /// not checked.
    ///
    /// Access restrictions are ignored; a page only members can see is
    /// still a valid target.
    pub async fn status_of(&self, redirect: &Redirect) -> Result<IntegrityStatus, AppError> {
        if redirect.is_regex && redirect.target.contains('$') {
            return Ok(IntegrityStatus::Unknown);
        }

        let internal = match RedirectTarget::parse(&redirect.target) {
            Ok(RedirectTarget::Internal(internal)) => internal,
            Ok(_) => return Ok(IntegrityStatus::Unknown),
            Err(_) => return Ok(IntegrityStatus::Broken),
        };

        let resolved = self
            .router
            .resolve_page(
                self.pages.as_ref(),
                internal.page_id,
                internal.language_id,
                Utc::now(),
            )
            .await?;

        Ok(if resolved.is_some() {
            IntegrityStatus::Ok
        } else {
            IntegrityStatus::Broken
        })
    }

    /// Recomputes the status of every rule and stores the ones that changed.
    pub async fn refresh(&self) -> Result<IntegrityReport, AppError> {
        let mut report = IntegrityReport::default();

        for redirect in self.redirects.list_all().await? {
            let status = self.status_of(&redirect).await?;
            report.checked += 1;
            if status == IntegrityStatus::Broken {
                report.broken += 1;
            }
            if status != redirect.integrity_status {
                self.redirects
                    .update(
                        redirect.id,
                        RedirectPatch {
                            integrity_status: Some(status),
                            ..Default::default()
                        },
                    )
                    .await?;
                report.changed += 1;
            }
        }

        tracing::info!(
            checked = report.checked,
            changed = report.changed,
            broken = report.broken,
            "Redirect integrity refreshed"
        );
        Ok(report)
    }
}
