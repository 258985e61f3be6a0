//! Page records forming the content tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of page, deciding whether it has a URL of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Standard,
    Shortcut,
    ExternalLink,
    Spacer,
    Folder,
    RecycleBin,
}

impl PageType {
    /// Pages of this type are reachable by URL.
    pub fn is_routable(self) -> bool {
        matches!(self, Self::Standard | Self::Shortcut | Self::ExternalLink)
    }

    pub fn as_i16(self) -> i16 {
        match self {
            Self::Standard => 1,
            Self::ExternalLink => 3,
            Self::Shortcut => 4,
            Self::Spacer => 199,
            Self::Folder => 254,
            Self::RecycleBin => 255,
        }
    }

    /// Unknown codes fall back to [`PageType::Standard`].
    pub fn from_i16(value: i16) -> Self {
        match value {
            3 => Self::ExternalLink,
            4 => Self::Shortcut,
            199 => Self::Spacer,
            254 => Self::Folder,
            255 => Self::RecycleBin,
            _ => Self::Standard,
        }
    }
}

/// One language version of a page.
///
/// Default-language records have `page_id == id` and `language_id == 0`.
/// Translations carry their own `id` and point at the default record through
/// `page_id`; `parent_id` always refers to the default-language parent page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: i64,
    pub page_id: i64,
    pub parent_id: Option<i64>,
    pub language_id: i64,
    /// Path segment below the parent, without leading or trailing slashes.
    /// Empty for a site root living at the base path.
    pub slug: String,
    pub title: String,
    pub page_type: PageType,
    pub hidden: bool,
    /// Hidden state and time window also apply to all subpages.
    pub extend_to_subpages: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Frontend groups allowed to see the page; empty means public.
    pub access_groups: Vec<i64>,
    pub sorting: i32,
}

impl PageRecord {
    /// A visible standard page in the default language.
    pub fn new(id: i64, parent_id: Option<i64>, slug: impl Into<String>) -> Self {
        Self {
            id,
            page_id: id,
            parent_id,
            language_id: 0,
            slug: normalize_slug(&slug.into()),
            title: String::new(),
            page_type: PageType::Standard,
            hidden: false,
            extend_to_subpages: false,
            starts_at: None,
            ends_at: None,
            access_groups: Vec::new(),
            sorting: 0,
        }
    }

    /// A translation of `default` with its own record id and slug.
    pub fn translation_of(
        default: &PageRecord,
        id: i64,
        language_id: i64,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            id,
            page_id: default.page_id,
            parent_id: default.parent_id,
            language_id,
            slug: normalize_slug(&slug.into()),
            title: default.title.clone(),
            page_type: default.page_type,
            hidden: false,
            extend_to_subpages: false,
            starts_at: None,
            ends_at: None,
            access_groups: default.access_groups.clone(),
            sorting: default.sorting,
        }
    }

    pub fn is_translation(&self) -> bool {
        self.language_id != 0
    }

    /// Not hidden and inside its publication window at `now`.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        !self.hidden
            && self.starts_at.is_none_or(|start| start <= now)
            && self.ends_at.is_none_or(|end| end > now)
    }

    /// Visible and of a page type that owns a URL.
    pub fn is_routable_at(&self, now: DateTime<Utc>) -> bool {
        self.page_type.is_routable() && self.is_visible_at(now)
    }

    /// Whether this page hides its whole subtree at `now`.
    pub fn hides_subpages_at(&self, now: DateTime<Utc>) -> bool {
        self.extend_to_subpages && !self.is_visible_at(now)
    }

    /// True if a user in `groups` may see the page.
    pub fn is_accessible_for(&self, groups: &[i64]) -> bool {
        self.access_groups.is_empty() || self.access_groups.iter().any(|g| groups.contains(g))
    }
}

/// Strips surrounding slashes and collapses empty segments.
///
/// `"/a//b/"` becomes `"a/b"`, `"/"` becomes `""`.
pub fn normalize_slug(slug: &str) -> String {
    slug.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Authenticated frontend visitor, provided by an upstream layer as a
/// request extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontendUser {
    pub id: i64,
    pub groups: Vec<i64>,
}
