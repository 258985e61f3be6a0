#![allow(dead_code)]

use std::sync::Arc;

use slug_redirects::application::services::{HitTracker, RequestContext, ResolvedRedirect};
use slug_redirects::domain::entities::{PageRecord, Site, SiteLanguage, SiteRedirectSettings};
use slug_redirects::domain::events::RedirectPersistHooks;
use slug_redirects::domain::hit_event::HitEvent;
use slug_redirects::domain::site_finder::SiteFinder;
use slug_redirects::infrastructure::memory::InMemoryStore;
use slug_redirects::state::{AppState, RedirectSettings, Repositories};
use tokio::sync::mpsc;
use url::Url;

pub const HOST: &str = "www.example.com";

pub fn language(language_id: i64, base: &str) -> SiteLanguage {
    SiteLanguage {
        language_id,
        base: base.to_string(),
        title: format!("Language {language_id}"),
        enabled: true,
    }
}

pub fn site(identifier: &str, root_page_id: i64, base: &str, languages: Vec<SiteLanguage>) -> Site {
    Site {
        identifier: identifier.to_string(),
        root_page_id,
        base: base.to_string(),
        languages,
        route_suffix: None,
        redirects: SiteRedirectSettings::default(),
    }
}

/// `https://www.example.com/` with a single default language.
pub fn example_site() -> Site {
    site("main", 1, "https://www.example.com/", vec![language(0, "/")])
}

/// ```text
/// 1 (root)
/// ├── 2 dummy-1-2
/// │   └── 5 dummy-1-2-5
/// └── 3 dummy-1-3
/// ```
pub fn example_tree() -> Vec<PageRecord> {
    let mut pages = vec![
        PageRecord::new(1, None, ""),
        PageRecord::new(2, Some(1), "dummy-1-2"),
        PageRecord::new(3, Some(1), "dummy-1-3"),
        PageRecord::new(5, Some(2), "dummy-1-2-5"),
    ];
    for (sorting, page) in pages.iter_mut().enumerate() {
        page.sorting = sorting as i32;
    }
    pages
}

pub struct TestContext {
    pub store: InMemoryStore,
    pub state: AppState,
    pub hits: mpsc::Receiver<HitEvent>,
}

impl TestContext {
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder::default()
    }

    /// The example site over the example tree.
    pub fn example() -> Self {
        Self::builder()
            .site(example_site())
            .pages(example_tree())
            .build()
    }

    /// Runs the redirect decision for an absolute request URL.
    pub async fn evaluate(&self, url: &str) -> Option<ResolvedRedirect> {
        let url = Url::parse(url).unwrap();
        let host = match url.port() {
            Some(port) => format!("{}:{port}", url.host_str().unwrap()),
            None => url.host_str().unwrap().to_string(),
        };
        let path = url.path().to_string();
        let query = url.query().unwrap_or_default().to_string();
        let site = self
            .state
            .sites
            .match_request(&host, &path)
            .map(|m| m.site.clone());
        let ctx = RequestContext::new(url).with_site(site);
        self.state.engine.evaluate(&host, &path, &query, &ctx).await
    }

    /// Location of the redirect answering `url`, if any.
    pub async fn location(&self, url: &str) -> Option<String> {
        self.evaluate(url).await.map(|r| r.location.to_string())
    }
}

pub struct TestContextBuilder {
    sites: Vec<Site>,
    pages: Vec<PageRecord>,
    hooks: RedirectPersistHooks,
    hit_count_enabled: bool,
    case_insensitive: bool,
}

impl Default for TestContextBuilder {
    fn default() -> Self {
        Self {
            sites: Vec::new(),
            pages: Vec::new(),
            hooks: RedirectPersistHooks::new(),
            hit_count_enabled: true,
            case_insensitive: false,
        }
    }
}

impl TestContextBuilder {
    pub fn site(mut self, site: Site) -> Self {
        self.sites.push(site);
        self
    }

    pub fn pages(mut self, pages: impl IntoIterator<Item = PageRecord>) -> Self {
        self.pages.extend(pages);
        self
    }

    pub fn hooks(mut self, hooks: RedirectPersistHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn hit_counting(mut self, enabled: bool) -> Self {
        self.hit_count_enabled = enabled;
        self
    }

    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    pub fn build(self) -> TestContext {
        let store = InMemoryStore::with_pages(self.pages);
        let (tx, rx) = mpsc::channel(100);
        let state = AppState::new(
            Repositories::in_memory(store.clone()),
            Arc::new(SiteFinder::new(self.sites)),
            HitTracker::new(self.hit_count_enabled, tx),
            RedirectSettings {
                case_insensitive: self.case_insensitive,
                redirect_by: "SlugRedirects".to_string(),
            },
            self.hooks,
        );
        TestContext {
            store,
            state,
            hits: rx,
        }
    }
}

/// `(source_host, source_path, target)` of every live rule, by id.
pub async fn live_rules(store: &InMemoryStore) -> Vec<(String, String, String)> {
    store
        .redirects()
        .await
        .into_iter()
        .filter(|r| r.deleted_at.is_none())
        .map(|r| (r.source_host, r.source_path, r.target))
        .collect()
}

pub fn rule(host: &str, path: &str, target: &str) -> (String, String, String) {
    (host.to_string(), path.to_string(), target.to_string())
}
