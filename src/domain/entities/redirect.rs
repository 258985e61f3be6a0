//! Redirect entity representing a stored redirect rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wildcard host matching every request host.
pub const ANY_HOST: &str = "*";

/// How a redirect record came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationType {
    Manual,
    AutoCreated,
}

impl CreationType {
    /// Numeric code used by the `creation_type` column.
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Manual => 0,
            Self::AutoCreated => 1,
        }
    }

    /// Unknown codes are read as [`CreationType::Manual`], which is never
    /// overwritten automatically.
    pub fn from_i16(value: i16) -> Self {
        match value {
            1 => Self::AutoCreated,
            _ => Self::Manual,
        }
    }
}

/// Whether a redirect target still resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    Ok,
    Broken,
    Unknown,
}

impl IntegrityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Broken => "broken",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "ok" => Self::Ok,
            "broken" => Self::Broken,
            _ => Self::Unknown,
        }
    }
}

/// A redirect rule.
///
/// `source_path` is case-sensitive. When `is_regex` is set it holds a regular
/// expression (bare or delimited, e.g. `#^/old/(.*)$#i`), otherwise a literal
/// path, optionally followed by `?query` when `respect_query` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Redirect {
    pub id: i64,
    pub source_host: String,
    pub source_path: String,
    pub is_regex: bool,
    pub respect_query: bool,
    pub target: String,
    pub status_code: u16,
    pub disabled: bool,
    pub disable_hitcount: bool,
    pub protected: bool,
    pub hit_count: i64,
    pub last_hit_at: Option<DateTime<Utc>>,
    pub creation_type: CreationType,
    pub integrity_status: IntegrityStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Redirect {
    /// Returns true if the redirect has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if the rule may take part in matching at `now`.
    pub fn is_enabled_at(&self, now: DateTime<Utc>) -> bool {
        !self.disabled
            && !self.is_deleted()
            && self.starts_at.is_none_or(|start| start <= now)
            && self.ends_at.is_none_or(|end| end > now)
    }

    pub fn is_wildcard_host(&self) -> bool {
        self.source_host == ANY_HOST
    }

    pub fn is_auto_created(&self) -> bool {
        self.creation_type == CreationType::AutoCreated
    }

    /// Returns the literal path part of a non-regex source, without any
    /// `?query` suffix.
    pub fn literal_path(&self) -> &str {
        match self.source_path.split_once('?') {
            Some((path, _)) if self.respect_query => path,
            _ => &self.source_path,
        }
    }
}

/// Input data for creating a new redirect.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRedirect {
    pub source_host: String,
    pub source_path: String,
    pub is_regex: bool,
    pub respect_query: bool,
    pub target: String,
    pub status_code: u16,
    pub disable_hitcount: bool,
    pub protected: bool,
    pub creation_type: CreationType,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub correlation_id: Option<String>,
}

impl NewRedirect {
    /// A manual, literal rule with a 307 status.
    pub fn manual(
        source_host: impl Into<String>,
        source_path: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source_host: source_host.into(),
            source_path: source_path.into(),
            is_regex: false,
            respect_query: false,
            target: target.into(),
            status_code: 307,
            disable_hitcount: false,
            protected: false,
            creation_type: CreationType::Manual,
            starts_at: None,
            ends_at: None,
            correlation_id: None,
        }
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn regex(mut self) -> Self {
        self.is_regex = true;
        self
    }

    pub fn respecting_query(mut self) -> Self {
        self.respect_query = true;
        self
    }
}

/// Partial update for an existing redirect.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedirectPatch {
    pub target: Option<String>,
    pub status_code: Option<u16>,
    pub disabled: Option<bool>,
    pub integrity_status: Option<IntegrityStatus>,
    pub correlation_id: Option<String>,
}
