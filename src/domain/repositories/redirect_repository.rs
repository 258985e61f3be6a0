//! Repository trait for redirect rule data access.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::entities::{CreationType, IntegrityStatus, NewRedirect, Redirect, RedirectPatch};
use crate::error::AppError;

/// Default page size of the administrative listing.
pub const DEFAULT_FILTER_LIMIT: u32 = 50;

/// Sortable columns of the administrative listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectOrderField {
    #[default]
    SourceHost,
    SourcePath,
    LastHitAt,
    HitCount,
    Protected,
}

impl RedirectOrderField {
    pub fn column(self) -> &'static str {
        match self {
            Self::SourceHost => "source_host",
            Self::SourcePath => "source_path",
            Self::LastHitAt => "last_hit_at",
            Self::HitCount => "hit_count",
            Self::Protected => "protected",
        }
    }

    /// Unknown names fall back to the default field.
    pub fn parse(value: &str) -> Self {
        match value {
            "source_path" => Self::SourcePath,
            "last_hit_at" | "lasthiton" => Self::LastHitAt,
            "hit_count" | "hitcount" => Self::HitCount,
            "protected" => Self::Protected,
            _ => Self::SourceHost,
        }
    }

    fn compare(self, a: &Redirect, b: &Redirect) -> Ordering {
        match self {
            Self::SourceHost => a.source_host.cmp(&b.source_host),
            Self::SourcePath => a.source_path.cmp(&b.source_path),
            Self::LastHitAt => a.last_hit_at.cmp(&b.last_hit_at),
            Self::HitCount => a.hit_count.cmp(&b.hit_count),
            Self::Protected => a.protected.cmp(&b.protected),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter, ordering and paging of the administrative redirect listing.
///
/// Empty collections and `None` fields impose no constraint. Soft-deleted
/// rules are never listed.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectFilter {
    pub source_hosts: Vec<String>,
    /// Substring of the source path.
    pub source_path: Option<String>,
    /// Substring of the stored target.
    pub target: Option<String>,
    pub status_codes: Vec<u16>,
    /// Only rules with fewer hits than this.
    pub max_hits: Option<i64>,
    /// Only rules not hit since this instant (never-hit rules count by
    /// creation time).
    pub older_than: Option<DateTime<Utc>>,
    pub creation_type: Option<CreationType>,
    pub protected: Option<bool>,
    pub integrity_status: Option<IntegrityStatus>,
    pub order_field: RedirectOrderField,
    pub order_direction: OrderDirection,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for RedirectFilter {
    fn default() -> Self {
        Self {
            source_hosts: Vec::new(),
            source_path: None,
            target: None,
            status_codes: Vec::new(),
            max_hits: None,
            older_than: None,
            creation_type: None,
            protected: None,
            integrity_status: None,
            order_field: RedirectOrderField::default(),
            order_direction: OrderDirection::default(),
            page: 1,
            limit: DEFAULT_FILTER_LIMIT,
        }
    }
}

impl RedirectFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(self.limit)
    }

    /// Evaluates the filter constraints against one rule.
    pub fn matches(&self, redirect: &Redirect) -> bool {
        if redirect.is_deleted() {
            return false;
        }
        if !self.source_hosts.is_empty() && !self.source_hosts.contains(&redirect.source_host) {
            return false;
        }
        if let Some(path) = &self.source_path
            && !redirect.source_path.contains(path.as_str())
        {
            return false;
        }
        if let Some(target) = &self.target
            && !redirect.target.contains(target.as_str())
        {
            return false;
        }
        if !self.status_codes.is_empty() && !self.status_codes.contains(&redirect.status_code) {
            return false;
        }
        if let Some(max_hits) = self.max_hits
            && redirect.hit_count >= max_hits
        {
            return false;
        }
        if let Some(older_than) = self.older_than {
            let last_activity = redirect.last_hit_at.unwrap_or(redirect.created_at);
            if last_activity >= older_than {
                return false;
            }
        }
        if self.creation_type.is_some_and(|t| t != redirect.creation_type) {
            return false;
        }
        if self.protected.is_some_and(|p| p != redirect.protected) {
            return false;
        }
        if self
            .integrity_status
            .is_some_and(|s| s != redirect.integrity_status)
        {
            return false;
        }
        true
    }

    /// Listing order: the chosen field, then source host, then id.
    pub fn compare(&self, a: &Redirect, b: &Redirect) -> Ordering {
        let primary = self.order_field.compare(a, b);
        let primary = match self.order_direction {
            OrderDirection::Asc => primary,
            OrderDirection::Desc => primary.reverse(),
        };
        primary
            .then_with(|| a.source_host.cmp(&b.source_host))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Repository interface for redirect rules.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRedirectRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedirectRepository: Send + Sync {
    /// Rules that may match a request on `host` (or any host) for `path`.
    ///
    /// Returns every non-deleted, non-disabled rule on `host` or `*` whose
    /// path equals `path` (ignoring a `?query` suffix for query-aware rules),
    /// every regex rule, and with `case_insensitive` the rules whose path
    /// equals `path` ignoring ASCII case. Final selection is left to the
    /// matcher.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_candidates(
        &self,
        host: &str,
        path: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Redirect>, AppError>;

    /// Finds a non-deleted rule by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Redirect>, AppError>;

    /// Non-deleted literal rules stored for exactly `host` and `source_path`.
    async fn find_by_source(
        &self,
        host: &str,
        source_path: &str,
    ) -> Result<Vec<Redirect>, AppError>;

    /// Stores a new rule.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_redirect: NewRedirect) -> Result<Redirect, AppError>;

    /// Partially updates a rule. `None` fields in the patch are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live rule has this id.
    async fn update(&self, id: i64, patch: RedirectPatch) -> Result<Redirect, AppError>;

    /// Soft-deletes a rule. Returns `false` if it was missing or already deleted.
    async fn soft_delete(&self, id: i64) -> Result<bool, AppError>;

    /// Adds one hit and sets the last hit time in a single atomic statement.
    async fn increment_hit(&self, id: i64, hit_at: DateTime<Utc>) -> Result<(), AppError>;

    /// Lists rules matching a filter, ordered and paged.
    async fn list(&self, filter: &RedirectFilter) -> Result<Vec<Redirect>, AppError>;

    /// Counts rules matching a filter, ignoring paging.
    async fn count(&self, filter: &RedirectFilter) -> Result<i64, AppError>;

    /// All non-deleted rules, ordered by id.
    async fn list_all(&self) -> Result<Vec<Redirect>, AppError>;
}
