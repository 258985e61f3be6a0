//! Shared application state handed to every handler and middleware.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{
    HitTracker, IntegrityService, PageRouter, RedirectEngine, RedirectMatcher, RedirectService,
    SlugChangeAnalyzer, SlugService, TargetResolver,
};
use crate::domain::events::RedirectPersistHooks;
use crate::domain::repositories::{PageRepository, RedirectRepository, UnitOfWork};
use crate::domain::site_finder::SiteFinder;
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::persistence::{PgPageRepository, PgRedirectRepository, PgUnitOfWork};

/// Storage backends the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub redirects: Arc<dyn RedirectRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            redirects: Arc::new(PgRedirectRepository::new(pool.clone())),
            pages: Arc::new(PgPageRepository::new(pool.clone())),
            unit_of_work: Arc::new(PgUnitOfWork::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            redirects: Arc::new(store.clone()),
            pages: Arc::new(store.clone()),
            unit_of_work: Arc::new(store),
        }
    }
}

/// Request-path switches of the redirect engine.
#[derive(Debug, Clone)]
pub struct RedirectSettings {
    pub case_insensitive: bool,
    /// Product name in the `X-Redirect-By` header.
    pub redirect_by: String,
}

#[derive(Clone)]
pub struct AppState {
    pub sites: Arc<SiteFinder>,
    pub engine: Arc<RedirectEngine>,
    pub hit_tracker: HitTracker,
    pub slug_service: Arc<SlugService>,
    pub redirect_service: Arc<RedirectService>,
    pub integrity_service: Arc<IntegrityService>,
    pub redirect_by: Arc<str>,
}

impl AppState {
    /// Wires every service onto `repositories`.
    pub fn new(
        repositories: Repositories,
        sites: Arc<SiteFinder>,
        hit_tracker: HitTracker,
        settings: RedirectSettings,
        hooks: RedirectPersistHooks,
    ) -> Self {
        let router = PageRouter::new(sites.clone());

        let engine = RedirectEngine::new(
            RedirectMatcher::new(repositories.redirects.clone(), settings.case_insensitive),
            TargetResolver::new(repositories.pages.clone(), router.clone()),
        );
        let slug_service = SlugService::new(
            repositories.unit_of_work.clone(),
            SlugChangeAnalyzer::new(router.clone()),
            hooks,
            settings.case_insensitive,
        );
        let integrity_service = IntegrityService::new(
            repositories.redirects.clone(),
            repositories.pages.clone(),
            router,
        );

        Self {
            sites,
            engine: Arc::new(engine),
            hit_tracker,
            slug_service: Arc::new(slug_service),
            redirect_service: Arc::new(RedirectService::new(repositories.redirects)),
            integrity_service: Arc::new(integrity_service),
            redirect_by: Arc::from(settings.redirect_by.trim()),
        }
    }
}
