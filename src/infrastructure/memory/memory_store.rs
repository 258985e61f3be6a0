//! In-process store implementing every repository trait.
//!
//! Used by the integration tests and by embedders without a database. All
//! data sits behind one `RwLock`; a rename transaction holds the write lock
//! for its whole lifetime and works on a staged copy that replaces the live
//! state on commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock};

use crate::domain::entities::{
    ANY_HOST, IntegrityStatus, NewRedirect, PageRecord, Redirect, RedirectPatch,
};
use crate::domain::repositories::{
    PageRepository, RedirectFilter, RedirectRepository, RenameTransaction, UnitOfWork,
};
use crate::error::AppError;

/// Contents of an [`InMemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    redirects: Vec<Redirect>,
    pages: Vec<PageRecord>,
    next_redirect_id: i64,
}

fn trim_trailing_slash(path: &str) -> &str {
    path.trim_end_matches('/')
}

impl MemoryState {
    fn find_candidates(&self, host: &str, path: &str, case_insensitive: bool) -> Vec<Redirect> {
        let path = trim_trailing_slash(path);
        self.redirects
            .iter()
            .filter(|r| !r.is_deleted() && !r.disabled)
            .filter(|r| r.source_host == ANY_HOST || r.source_host.eq_ignore_ascii_case(host))
            .filter(|r| {
                let literal = trim_trailing_slash(r.literal_path());
                r.is_regex || literal == path || (case_insensitive && literal.eq_ignore_ascii_case(path))
            })
            .cloned()
            .collect()
    }

    fn find_by_id(&self, id: i64) -> Option<Redirect> {
        self.redirects
            .iter()
            .find(|r| r.id == id && !r.is_deleted())
            .cloned()
    }

    fn find_by_source(&self, host: &str, source_path: &str) -> Vec<Redirect> {
        self.redirects
            .iter()
            .filter(|r| {
                !r.is_deleted()
                    && !r.is_regex
                    && r.source_host == host
                    && r.source_path == source_path
            })
            .cloned()
            .collect()
    }

    fn create(&mut self, new_redirect: NewRedirect) -> Redirect {
        self.next_redirect_id += 1;
        let now = Utc::now();
        let redirect = Redirect {
            id: self.next_redirect_id,
            source_host: new_redirect.source_host,
            source_path: new_redirect.source_path,
            is_regex: new_redirect.is_regex,
            respect_query: new_redirect.respect_query,
            target: new_redirect.target,
            status_code: new_redirect.status_code,
            disabled: false,
            disable_hitcount: new_redirect.disable_hitcount,
            protected: new_redirect.protected,
            hit_count: 0,
            last_hit_at: None,
            creation_type: new_redirect.creation_type,
            integrity_status: IntegrityStatus::Unknown,
            starts_at: new_redirect.starts_at,
            ends_at: new_redirect.ends_at,
            correlation_id: new_redirect.correlation_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.redirects.push(redirect.clone());
        redirect
    }

    fn live_redirect_mut(&mut self, id: i64) -> Option<&mut Redirect> {
        self.redirects
            .iter_mut()
            .find(|r| r.id == id && !r.is_deleted())
    }

    fn update(&mut self, id: i64, patch: RedirectPatch) -> Result<Redirect, AppError> {
        let redirect = self
            .live_redirect_mut(id)
            .ok_or_else(|| AppError::not_found("Redirect not found", json!({ "id": id })))?;

        if let Some(target) = patch.target {
            redirect.target = target;
        }
        if let Some(status_code) = patch.status_code {
            redirect.status_code = status_code;
        }
        if let Some(disabled) = patch.disabled {
            redirect.disabled = disabled;
        }
        if let Some(status) = patch.integrity_status {
            redirect.integrity_status = status;
        }
        if let Some(correlation_id) = patch.correlation_id {
            redirect.correlation_id = Some(correlation_id);
        }
        redirect.updated_at = Utc::now();
        Ok(redirect.clone())
    }

    fn soft_delete(&mut self, id: i64) -> bool {
        match self.live_redirect_mut(id) {
            Some(redirect) => {
                let now = Utc::now();
                redirect.deleted_at = Some(now);
                redirect.updated_at = now;
                true
            }
            None => false,
        }
    }

    fn increment_hit(&mut self, id: i64, hit_at: DateTime<Utc>) {
        if let Some(redirect) = self.redirects.iter_mut().find(|r| r.id == id) {
            redirect.hit_count += 1;
            redirect.last_hit_at = Some(redirect.last_hit_at.map_or(hit_at, |last| last.max(hit_at)));
        }
    }

    fn list(&self, filter: &RedirectFilter) -> Vec<Redirect> {
        let mut matching: Vec<&Redirect> =
            self.redirects.iter().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| filter.compare(a, b));

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        matching
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .cloned()
            .collect()
    }

    fn count(&self, filter: &RedirectFilter) -> i64 {
        self.redirects.iter().filter(|r| filter.matches(r)).count() as i64
    }

    fn list_all(&self) -> Vec<Redirect> {
        let mut all: Vec<Redirect> = self
            .redirects
            .iter()
            .filter(|r| !r.is_deleted())
            .cloned()
            .collect();
        all.sort_by_key(|r| r.id);
        all
    }

    fn find_record(&self, record_id: i64) -> Option<PageRecord> {
        self.pages.iter().find(|p| p.id == record_id).cloned()
    }

    fn find_page(&self, page_id: i64, language_id: i64) -> Option<PageRecord> {
        self.pages
            .iter()
            .find(|p| p.page_id == page_id && p.language_id == language_id)
            .cloned()
    }

    fn find_versions(&self, page_id: i64) -> Vec<PageRecord> {
        let mut versions: Vec<PageRecord> = self
            .pages
            .iter()
            .filter(|p| p.page_id == page_id)
            .cloned()
            .collect();
        versions.sort_by_key(|p| p.language_id);
        versions
    }

    fn find_children(&self, page_id: i64) -> Vec<PageRecord> {
        let mut children: Vec<PageRecord> = self
            .pages
            .iter()
            .filter(|p| !p.is_translation() && p.parent_id == Some(page_id))
            .cloned()
            .collect();
        children.sort_by_key(|p| (p.sorting, p.id));
        children
    }

    fn update_slug(&mut self, record_id: i64, slug: &str) -> Result<PageRecord, AppError> {
        let page = self
            .pages
            .iter_mut()
            .find(|p| p.id == record_id)
            .ok_or_else(|| AppError::not_found("Page not found", json!({ "record_id": record_id })))?;
        page.slug = slug.to_string();
        Ok(page.clone())
    }
}

/// Shared in-memory store. Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with `pages`.
    pub fn with_pages(pages: impl IntoIterator<Item = PageRecord>) -> Self {
        let state = MemoryState {
            pages: pages.into_iter().collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Adds or replaces a page record by id.
    pub async fn upsert_page(&self, page: PageRecord) {
        let mut state = self.state.write().await;
        match state.pages.iter_mut().find(|p| p.id == page.id) {
            Some(existing) => *existing = page,
            None => state.pages.push(page),
        }
    }

    /// Every stored rule, soft-deleted ones included, by id.
    pub async fn redirects(&self) -> Vec<Redirect> {
        let mut redirects = self.state.read().await.redirects.clone();
        redirects.sort_by_key(|r| r.id);
        redirects
    }

    pub async fn pages(&self) -> Vec<PageRecord> {
        self.state.read().await.pages.clone()
    }
}

#[async_trait]
impl RedirectRepository for InMemoryStore {
    async fn find_candidates(
        &self,
        host: &str,
        path: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Redirect>, AppError> {
        Ok(self.state.read().await.find_candidates(host, path, case_insensitive))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Redirect>, AppError> {
        Ok(self.state.read().await.find_by_id(id))
    }

    async fn find_by_source(
        &self,
        host: &str,
        source_path: &str,
    ) -> Result<Vec<Redirect>, AppError> {
        Ok(self.state.read().await.find_by_source(host, source_path))
    }

    async fn create(&self, new_redirect: NewRedirect) -> Result<Redirect, AppError> {
        Ok(self.state.write().await.create(new_redirect))
    }

    async fn update(&self, id: i64, patch: RedirectPatch) -> Result<Redirect, AppError> {
        self.state.write().await.update(id, patch)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.state.write().await.soft_delete(id))
    }

    async fn increment_hit(&self, id: i64, hit_at: DateTime<Utc>) -> Result<(), AppError> {
        self.state.write().await.increment_hit(id, hit_at);
        Ok(())
    }

    async fn list(&self, filter: &RedirectFilter) -> Result<Vec<Redirect>, AppError> {
        Ok(self.state.read().await.list(filter))
    }

    async fn count(&self, filter: &RedirectFilter) -> Result<i64, AppError> {
        Ok(self.state.read().await.count(filter))
    }

    async fn list_all(&self) -> Result<Vec<Redirect>, AppError> {
        Ok(self.state.read().await.list_all())
    }
}

#[async_trait]
impl PageRepository for InMemoryStore {
    async fn find_record(&self, record_id: i64) -> Result<Option<PageRecord>, AppError> {
        Ok(self.state.read().await.find_record(record_id))
    }

    async fn find_page(
        &self,
        page_id: i64,
        language_id: i64,
    ) -> Result<Option<PageRecord>, AppError> {
        Ok(self.state.read().await.find_page(page_id, language_id))
    }

    async fn find_versions(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError> {
        Ok(self.state.read().await.find_versions(page_id))
    }

    async fn find_children(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError> {
        Ok(self.state.read().await.find_children(page_id))
    }

    async fn update_slug(&self, record_id: i64, slug: &str) -> Result<PageRecord, AppError> {
        self.state.write().await.update_slug(record_id, slug)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn RenameTransaction>, AppError> {
        let live = Arc::clone(&self.state).write_owned().await;
        let staged = live.clone();
        Ok(Box::new(MemoryTransaction {
            live,
            staged: Mutex::new(staged),
        }))
    }
}

/// Transaction over an [`InMemoryStore`]; blocks every other access until it
/// is committed or dropped.
pub struct MemoryTransaction {
    live: OwnedRwLockWriteGuard<MemoryState>,
    staged: Mutex<MemoryState>,
}

#[async_trait]
impl RenameTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTransaction { mut live, staged } = *self;
        *live = staged.into_inner();
        Ok(())
    }
}

#[async_trait]
impl RedirectRepository for MemoryTransaction {
    async fn find_candidates(
        &self,
        host: &str,
        path: &str,
        case_insensitive: bool,
    ) -> Result<Vec<Redirect>, AppError> {
        Ok(self.staged.lock().await.find_candidates(host, path, case_insensitive))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Redirect>, AppError> {
        Ok(self.staged.lock().await.find_by_id(id))
    }

    async fn find_by_source(
        &self,
        host: &str,
        source_path: &str,
    ) -> Result<Vec<Redirect>, AppError> {
        Ok(self.staged.lock().await.find_by_source(host, source_path))
    }

    async fn create(&self, new_redirect: NewRedirect) -> Result<Redirect, AppError> {
        Ok(self.staged.lock().await.create(new_redirect))
    }

    async fn update(&self, id: i64, patch: RedirectPatch) -> Result<Redirect, AppError> {
        self.staged.lock().await.update(id, patch)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.staged.lock().await.soft_delete(id))
    }

    async fn increment_hit(&self, id: i64, hit_at: DateTime<Utc>) -> Result<(), AppError> {
        self.staged.lock().await.increment_hit(id, hit_at);
        Ok(())
    }

    async fn list(&self, filter: &RedirectFilter) -> Result<Vec<Redirect>, AppError> {
        Ok(self.staged.lock().await.list(filter))
    }

    async fn count(&self, filter: &RedirectFilter) -> Result<i64, AppError> {
        Ok(self.staged.lock().await.count(filter))
    }

    async fn list_all(&self) -> Result<Vec<Redirect>, AppError> {
        Ok(self.staged.lock().await.list_all())
    }
}

#[async_trait]
impl PageRepository for MemoryTransaction {
    async fn find_record(&self, record_id: i64) -> Result<Option<PageRecord>, AppError> {
        Ok(self.staged.lock().await.find_record(record_id))
    }

    async fn find_page(
        &self,
        page_id: i64,
        language_id: i64,
    ) -> Result<Option<PageRecord>, AppError> {
        Ok(self.staged.lock().await.find_page(page_id, language_id))
    }

    async fn find_versions(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError> {
        Ok(self.staged.lock().await.find_versions(page_id))
    }

    async fn find_children(&self, page_id: i64) -> Result<Vec<PageRecord>, AppError> {
        Ok(self.staged.lock().await.find_children(page_id))
    }

    async fn update_slug(&self, record_id: i64, slug: &str) -> Result<PageRecord, AppError> {
        self.staged.lock().await.update_slug(record_id, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CreationType;

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = InMemoryStore::new();
        {
            let tx = store.begin().await.unwrap();
            tx.create(NewRedirect::manual("*", "/a", "/b")).await.unwrap();
        }
        assert!(store.redirects().await.is_empty());
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let store = InMemoryStore::with_pages([PageRecord::new(1, None, "")]);
        let tx = store.begin().await.unwrap();
        tx.create(NewRedirect::manual("*", "/a", "/b")).await.unwrap();
        tx.update_slug(1, "home").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.redirects().await.len(), 1);
        assert_eq!(store.find_record(1).await.unwrap().unwrap().slug, "home");
    }

    #[tokio::test]
    async fn test_candidates_ignore_trailing_slash_and_deleted() {
        let store = InMemoryStore::new();
        let kept = store
            .create(NewRedirect::manual("example.com", "/old/", "/new"))
            .await
            .unwrap();
        let deleted = store
            .create(NewRedirect::manual("*", "/old", "/gone"))
            .await
            .unwrap();
        store.soft_delete(deleted.id).await.unwrap();

        let candidates = store.find_candidates("Example.com", "/old", false).await.unwrap();
        assert_eq!(candidates.iter().map(|r| r.id).collect::<Vec<_>>(), vec![kept.id]);
        assert_eq!(candidates[0].creation_type, CreationType::Manual);
    }

    #[tokio::test]
    async fn test_concurrent_hits_are_not_lost() {
        let store = InMemoryStore::new();
        let redirect = store
            .create(NewRedirect::manual("*", "/a", "/b"))
            .await
            .unwrap();
        let now = Utc::now();

        let (a, b) = tokio::join!(
            store.increment_hit(redirect.id, now),
            store.increment_hit(redirect.id, now)
        );
        a.unwrap();
        b.unwrap();

        let stored = store.find_by_id(redirect.id).await.unwrap().unwrap();
        assert_eq!(stored.hit_count, 2);
        assert_eq!(stored.last_hit_at, Some(now));
    }
}
