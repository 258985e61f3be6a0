//! Slug renames and the redirects they leave behind.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use serde_json::json;

use crate::application::services::redirect_matcher::same_literal_path;
use crate::application::services::slug_analyzer::{LiveLocation, SlugChangeAnalyzer};
use crate::domain::change_item::{CorrelationId, SlugChangeItem};
use crate::domain::entities::{PageRecord, Redirect, RedirectPatch, normalize_slug};
use crate::domain::events::{RedirectCandidate, RedirectPersistHooks};
use crate::domain::repositories::{PageRepository, RedirectRepository, UnitOfWork};
use crate::error::AppError;

/// Correlation scope of redirects created by renames.
pub const CORRELATION_SCOPE: &str = "slug_change";

/// What persisting one rename's redirects did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenameOutcome {
    pub created: Vec<Redirect>,
    pub updated: Vec<Redirect>,
    /// Candidates not stored because a manual or protected rule owns the
    /// source.
    pub skipped: Vec<RedirectCandidate>,
    /// Ids of automatic rules removed because they pointed away from a path
    /// that is live again, visible or not.
    pub removed: Vec<i64>,
}

/// Result of [`SlugService::rename_page`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenameResult {
    pub page: PageRecord,
    pub correlation_id: Option<CorrelationId>,
    pub outcome: RenameOutcome,
}

pub struct SlugService {
    unit_of_work: Arc<dyn UnitOfWork>,
    analyzer: SlugChangeAnalyzer,
    hooks: RedirectPersistHooks,
    /// Path comparison of the redirect matcher.
    case_insensitive: bool,
}

impl SlugService {
    pub fn new(
        unit_of_work: Arc<dyn UnitOfWork>,
        analyzer: SlugChangeAnalyzer,
        hooks: RedirectPersistHooks,
        case_insensitive: bool,
    ) -> Self {
        Self {
            unit_of_work,
            analyzer,
            hooks,
            case_insensitive,
        }
    }

    /// Renames a page record and creates the redirects for it, atomically.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the slug contains characters not allowed
    ///   in a path segment
    /// - [`AppError::NotFound`] if the record does not exist
    /// - any repository or hook error; nothing is written in that case
    pub async fn rename_page(&self, record_id: i64, new_slug: &str) -> Result<RenameResult, AppError> {
        validate_slug(new_slug)?;

        let tx = self.unit_of_work.begin().await?;
        let record = tx.find_record(record_id).await?.ok_or_else(|| {
            AppError::not_found("Page not found", json!({ "record_id": record_id }))
        })?;

        let change = SlugChangeItem::new(record).with_changed_slug(new_slug);
        if !change.slug_changed() {
            return Ok(RenameResult {
                page: change.original().clone(),
                correlation_id: None,
                outcome: RenameOutcome::default(),
            });
        }

        let correlation_id = CorrelationId::for_scope(CORRELATION_SCOPE);
        let outcome = self
            .rebuild_redirects_for_rename(tx.as_ref(), &change, &correlation_id)
            .await?;
        let page = tx.update_slug(record_id, &change.changed().slug).await?;
        tx.commit().await?;

        tracing::info!(
            record_id,
            page_id = change.page_id(),
            language_id = change.language_id(),
            correlation_id = %correlation_id,
            created = outcome.created.len(),
            updated = outcome.updated.len(),
            skipped = outcome.skipped.len(),
            removed = outcome.removed.len(),
            "Page slug changed"
        );

        Ok(RenameResult {
            page,
            correlation_id: Some(correlation_id),
            outcome,
        })
    }

    /// Plans and persists the redirects for one rename inside `store`.
    ///
    /// `store` is expected to be the transaction of the rename; the first
    /// error aborts and is returned so the caller can roll back.
    pub async fn rebuild_redirects_for_rename<S>(
        &self,
        store: &S,
        change: &SlugChangeItem,
        correlation_id: &CorrelationId,
    ) -> Result<RenameOutcome, AppError>
    where
        S: RedirectRepository + PageRepository + ?Sized,
    {
        let plan = self.analyzer.plan(store, change, Utc::now()).await?;
        let mut outcome = RenameOutcome::default();

        for location in &plan.live_locations {
            outcome
                .removed
                .extend(self.remove_shadowing_redirects(store, location).await?);
        }

        for candidate in plan.candidates {
            // Old and new path only differ in ways the matcher ignores.
            if same_literal_path(&candidate.source_path, &candidate.new_path, self.case_insensitive) {
                tracing::debug!(
                    source_path = %candidate.source_path,
                    new_path = %candidate.new_path,
                    "Redirect would answer the page's own address, not stored"
                );
                continue;
            }

            let candidate = self.hooks.before_persist(change, candidate).await?;
            let existing = store
                .find_by_source(&candidate.source_host, &candidate.source_path)
                .await?;

            if existing
                .iter()
                .any(|r| !r.is_auto_created() || r.protected)
            {
                tracing::debug!(
                    source_host = %candidate.source_host,
                    source_path = %candidate.source_path,
                    "Existing manual or protected redirect kept"
                );
                outcome.skipped.push(candidate);
                continue;
            }

            let stored = match existing.first() {
                Some(previous) => {
                    let patch = RedirectPatch {
                        target: Some(candidate.target.to_string()),
                        status_code: Some(candidate.status_code),
                        disabled: Some(false),
                        integrity_status: None,
                        correlation_id: Some(correlation_id.to_string()),
                    };
                    let redirect = store.update(previous.id, patch).await?;
                    counter!("redirects_auto_updated_total").increment(1);
                    outcome.updated.push(redirect.clone());
                    redirect
                }
                None => {
                    let redirect = store.create(candidate.to_new_redirect(correlation_id)).await?;
                    counter!("redirects_auto_created_total").increment(1);
                    outcome.created.push(redirect.clone());
                    redirect
                }
            };

            tracing::info!(
                redirect_id = stored.id,
                correlation_id = %correlation_id,
                page_id = candidate.page_id,
                language_id = candidate.language_id,
                source_host = %stored.source_host,
                source_path = %stored.source_path,
                "Automatic redirect stored"
            );
            self.hooks.after_persist(change, &stored).await?;
        }

        Ok(outcome)
    }

    /// Soft-deletes automatic rules of the location's host that the matcher
    /// would apply to the page's new path.
    async fn remove_shadowing_redirects<S>(
        &self,
        store: &S,
        location: &LiveLocation,
    ) -> Result<Vec<i64>, AppError>
    where
        S: RedirectRepository + ?Sized,
    {
        let mut removed = Vec::new();
        for redirect in store
            .find_candidates(&location.source_host, &location.path, self.case_insensitive)
            .await?
        {
            if redirect.is_auto_created()
                && !redirect.protected
                && !redirect.is_regex
                && redirect.source_host.eq_ignore_ascii_case(&location.source_host)
                && same_literal_path(redirect.literal_path(), &location.path, self.case_insensitive)
                && store.soft_delete(redirect.id).await?
            {
                tracing::info!(
                    redirect_id = redirect.id,
                    source_path = %redirect.source_path,
                    "Removed automatic redirect shadowing a live page"
                );
                removed.push(redirect.id);
            }
        }
        Ok(removed)
    }
}

fn validate_slug(slug: &str) -> Result<(), AppError> {
    let normalized = normalize_slug(slug);
    let invalid = normalized
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '?' | '#' | '\\'));
    if invalid {
        return Err(AppError::bad_request(
            "Slug contains characters not allowed in a URL path",
            json!({ "slug": slug }),
        ));
    }
    Ok(())
}
