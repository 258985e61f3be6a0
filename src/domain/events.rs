//! Extension points around the persistence of auto-created redirects.
//!
//! Hooks are registered explicitly on a [`RedirectPersistHooks`] value that is
//! handed to the slug service. A pre-persist hook receives the candidate and
//! returns the (possibly modified) value to store; a post-persist hook is
//! notified with the stored record. Errors from either abort the rename.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::change_item::{CorrelationId, SlugChangeItem};
use crate::domain::entities::{CreationType, NewRedirect, Redirect, RedirectTarget};
use crate::error::AppError;

/// A redirect about to be created for a page whose URL changed.
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectCandidate {
    pub source_host: String,
    /// Old URL path of the page.
    pub source_path: String,
    pub target: RedirectTarget,
    pub status_code: u16,
    /// URL path the page lives at after the rename.
    pub new_path: String,
    pub page_id: i64,
    pub language_id: i64,
    pub site_identifier: String,
}

impl RedirectCandidate {
    pub fn to_new_redirect(&self, correlation_id: &CorrelationId) -> NewRedirect {
        NewRedirect {
            source_host: self.source_host.clone(),
            source_path: self.source_path.clone(),
            is_regex: false,
            respect_query: false,
            target: self.target.to_string(),
            status_code: self.status_code,
            disable_hitcount: false,
            protected: false,
            creation_type: CreationType::AutoCreated,
            starts_at: None,
            ends_at: None,
            correlation_id: Some(correlation_id.to_string()),
        }
    }
}

#[async_trait]
pub trait PreRedirectPersist: Send + Sync {
    async fn before_persist(
        &self,
        change: &SlugChangeItem,
        candidate: RedirectCandidate,
    ) -> Result<RedirectCandidate, AppError>;
}

#[async_trait]
pub trait PostRedirectPersist: Send + Sync {
    async fn after_persist(
        &self,
        change: &SlugChangeItem,
        redirect: &Redirect,
    ) -> Result<(), AppError>;
}

/// Ordered lists of registered hooks.
#[derive(Clone, Default)]
pub struct RedirectPersistHooks {
    pre: Vec<Arc<dyn PreRedirectPersist>>,
    post: Vec<Arc<dyn PostRedirectPersist>>,
}

impl RedirectPersistHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pre(mut self, hook: Arc<dyn PreRedirectPersist>) -> Self {
        self.pre.push(hook);
        self
    }

    pub fn with_post(mut self, hook: Arc<dyn PostRedirectPersist>) -> Self {
        self.post.push(hook);
        self
    }

    /// Runs every pre-persist hook in registration order, feeding each the
    /// output of the previous one.
    pub async fn before_persist(
        &self,
        change: &SlugChangeItem,
        mut candidate: RedirectCandidate,
    ) -> Result<RedirectCandidate, AppError> {
        for hook in &self.pre {
            candidate = hook.before_persist(change, candidate).await?;
        }
        Ok(candidate)
    }

    pub async fn after_persist(
        &self,
        change: &SlugChangeItem,
        redirect: &Redirect,
    ) -> Result<(), AppError> {
        for hook in &self.post {
            hook.after_persist(change, redirect).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedirectPersistHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectPersistHooks")
            .field("pre", &self.pre.len())
            .field("post", &self.post.len())
            .finish()
    }
}
