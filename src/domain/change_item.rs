//! Pending slug change of a page record.

use std::fmt;

use uuid::Uuid;

use crate::domain::entities::{PageRecord, normalize_slug};

/// Opaque tag grouping every redirect created by one rename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// A fresh id scoped to `scope`, e.g. `slug_change/<uuid>`.
    pub fn for_scope(scope: &str) -> Self {
        Self(format!("{scope}/{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot pair of a page record before and after a rename.
///
/// The original snapshot is fixed at construction. Changing attributes
/// produces a new item; an existing item is never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct SlugChangeItem {
    original: PageRecord,
    changed: PageRecord,
}

impl SlugChangeItem {
    /// An item whose changed snapshot still equals the original.
    pub fn new(original: PageRecord) -> Self {
        Self {
            changed: original.clone(),
            original,
        }
    }

    pub fn with_changed(&self, changed: PageRecord) -> Self {
        Self {
            original: self.original.clone(),
            changed,
        }
    }

    pub fn with_changed_slug(&self, slug: &str) -> Self {
        let mut changed = self.changed.clone();
        changed.slug = normalize_slug(slug);
        self.with_changed(changed)
    }

    pub fn original(&self) -> &PageRecord {
        &self.original
    }

    pub fn changed(&self) -> &PageRecord {
        &self.changed
    }

    pub fn record_id(&self) -> i64 {
        self.original.id
    }

    pub fn page_id(&self) -> i64 {
        self.original.page_id
    }

    pub fn language_id(&self) -> i64 {
        self.original.language_id
    }

    pub fn slug_changed(&self) -> bool {
        self.original.slug != self.changed.slug
    }
}
