//! DTOs for page slug renames.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::redirect::RedirectItem;
use crate::application::services::RenameResult;
use crate::domain::entities::PageRecord;
use crate::domain::events::RedirectCandidate;

/// Request body of `PUT /api/pages/{record_id}/slug`.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    /// New path segment; surrounding slashes are ignored.
    #[validate(length(max = 255))]
    pub slug: String,
}

/// A redirect that was not stored because a manual or protected rule owns
/// its source.
#[derive(Debug, Serialize)]
pub struct SkippedRedirect {
    pub source_host: String,
    pub source_path: String,
    pub target: String,
}

impl From<RedirectCandidate> for SkippedRedirect {
    fn from(c: RedirectCandidate) -> Self {
        Self {
            source_host: c.source_host,
            source_path: c.source_path,
            target: c.target.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RenameResponse {
    pub page: PageRecord,
    /// Absent when the slug did not change.
    pub correlation_id: Option<String>,
    pub created: Vec<RedirectItem>,
    pub updated: Vec<RedirectItem>,
    pub skipped: Vec<SkippedRedirect>,
    pub removed: Vec<i64>,
}

impl From<RenameResult> for RenameResponse {
    fn from(result: RenameResult) -> Self {
        let outcome = result.outcome;
        Self {
            page: result.page,
            correlation_id: result.correlation_id.map(|id| id.to_string()),
            created: outcome.created.into_iter().map(RedirectItem::from).collect(),
            updated: outcome.updated.into_iter().map(RedirectItem::from).collect(),
            skipped: outcome.skipped.into_iter().map(SkippedRedirect::from).collect(),
            removed: outcome.removed,
        }
    }
}
