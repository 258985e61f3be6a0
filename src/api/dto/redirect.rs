//! DTOs for the redirect listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::formats::CommaSeparator;
use serde_with::{DisplayFromStr, StringWithSeparator, serde_as};

use crate::api::dto::pagination::{PaginationMeta, PaginationParams};
use crate::domain::entities::{CreationType, IntegrityStatus, Redirect};
use crate::domain::repositories::{OrderDirection, RedirectFilter, RedirectOrderField};

/// Query parameters of `GET /api/redirects`.
///
/// List-valued parameters are comma separated, e.g.
/// `?source_hosts=example.com,*&status_codes=301,307`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct RedirectListQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    #[serde_as(as = "Option<StringWithSeparator<CommaSeparator, String>>")]
    #[serde(default)]
    pub source_hosts: Option<Vec<String>>,

    pub source_path: Option<String>,

    pub target: Option<String>,

    #[serde_as(as = "Option<StringWithSeparator<CommaSeparator, u16>>")]
    #[serde(default)]
    pub status_codes: Option<Vec<u16>>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub max_hits: Option<i64>,

    /// RFC 3339 instant.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub older_than: Option<DateTime<Utc>>,

    pub creation_type: Option<CreationType>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub protected: Option<bool>,

    pub integrity_status: Option<IntegrityStatus>,

    /// Unknown fields sort by source host.
    pub order_field: Option<String>,

    /// `asc` (default) or `desc`.
    pub order_direction: Option<String>,
}

impl RedirectListQuery {
    /// Converts the query into a repository filter for the given page.
    pub fn into_filter(self, page: u32, limit: u32) -> RedirectFilter {
        RedirectFilter {
            source_hosts: self.source_hosts.unwrap_or_default(),
            source_path: self.source_path.filter(|s| !s.is_empty()),
            target: self.target.filter(|s| !s.is_empty()),
            status_codes: self.status_codes.unwrap_or_default(),
            max_hits: self.max_hits,
            older_than: self.older_than,
            creation_type: self.creation_type,
            protected: self.protected,
            integrity_status: self.integrity_status,
            order_field: self
                .order_field
                .as_deref()
                .map(RedirectOrderField::parse)
                .unwrap_or_default(),
            order_direction: self
                .order_direction
                .as_deref()
                .map(OrderDirection::parse)
                .unwrap_or_default(),
            page,
            limit,
        }
    }
}

/// One redirect rule as exposed by the API.
#[derive(Debug, Serialize)]
pub struct RedirectItem {
    pub id: i64,
    pub source_host: String,
    pub source_path: String,
    pub is_regex: bool,
    pub respect_query: bool,
    pub target: String,
    pub status_code: u16,
    pub disabled: bool,
    pub protected: bool,
    pub hit_count: i64,
    pub last_hit_at: Option<DateTime<Utc>>,
    pub creation_type: CreationType,
    pub integrity_status: IntegrityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Redirect> for RedirectItem {
    fn from(r: Redirect) -> Self {
        Self {
            id: r.id,
            source_host: r.source_host,
            source_path: r.source_path,
            is_regex: r.is_regex,
            respect_query: r.respect_query,
            target: r.target,
            status_code: r.status_code,
            disabled: r.disabled,
            protected: r.protected,
            hit_count: r.hit_count,
            last_hit_at: r.last_hit_at,
            creation_type: r.creation_type,
            integrity_status: r.integrity_status,
            correlation_id: r.correlation_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Paginated list of redirect rules.
#[derive(Debug, Serialize)]
pub struct RedirectListResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<RedirectItem>,
}
