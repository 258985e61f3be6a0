mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{HOST, TestContext, example_site, example_tree, language, live_rules, rule, site};
use serde_json::json;
use slug_redirects::AppError;
use slug_redirects::domain::change_item::SlugChangeItem;
use slug_redirects::domain::entities::{CreationType, NewRedirect, PageRecord, PageType, Redirect};
use slug_redirects::domain::events::{
    PostRedirectPersist, PreRedirectPersist, RedirectCandidate, RedirectPersistHooks,
};
use slug_redirects::domain::repositories::RedirectRepository;

#[tokio::test]
async fn test_rename_creates_redirects_for_page_and_subpages() {
    let ctx = TestContext::example();

    let result = ctx
        .state
        .slug_service
        .rename_page(2, "/test-new")
        .await
        .unwrap();

    assert_eq!(result.page.slug, "test-new");
    let correlation_id = result.correlation_id.unwrap().to_string();
    assert!(correlation_id.starts_with("slug_change/"));

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/dummy-1-2", "page://2?_language=0"),
            rule(HOST, "/dummy-1-2/dummy-1-2-5", "page://5?_language=0"),
        ]
    );
    for redirect in &result.outcome.created {
        assert_eq!(redirect.creation_type, CreationType::AutoCreated);
        assert_eq!(redirect.status_code, 307);
        assert_eq!(redirect.correlation_id.as_deref(), Some(correlation_id.as_str()));
        assert!(!redirect.protected);
    }

    assert_eq!(
        ctx.location("https://www.example.com/dummy-1-2").await.as_deref(),
        Some("https://www.example.com/test-new")
    );
    assert_eq!(
        ctx.location("https://www.example.com/dummy-1-2/dummy-1-2-5").await.as_deref(),
        Some("https://www.example.com/test-new/dummy-1-2-5")
    );
    assert_eq!(ctx.location("https://www.example.com/dummy-1-3").await, None);
}

#[tokio::test]
async fn test_unchanged_slug_is_a_no_op() {
    let ctx = TestContext::example();

    let result = ctx
        .state
        .slug_service
        .rename_page(2, "dummy-1-2/")
        .await
        .unwrap();

    assert_eq!(result.correlation_id, None);
    assert!(result.outcome.created.is_empty());
    assert!(live_rules(&ctx.store).await.is_empty());
}

#[tokio::test]
async fn test_unknown_record_and_invalid_slug() {
    let ctx = TestContext::example();

    let missing = ctx.state.slug_service.rename_page(99, "x").await;
    assert!(matches!(missing, Err(AppError::NotFound { .. })));

    let invalid = ctx.state.slug_service.rename_page(2, "with space").await;
    assert!(matches!(invalid, Err(AppError::Validation { .. })));
}

#[tokio::test]
async fn test_site_in_sub_folder() {
    let ctx = TestContext::builder()
        .site(site(
            "main",
            1,
            "https://www.example.com/sub-folder/",
            vec![language(0, "/")],
        ))
        .pages(example_tree())
        .build();

    ctx.state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/sub-folder/dummy-1-2", "page://2?_language=0"),
            rule(HOST, "/sub-folder/dummy-1-2/dummy-1-2-5", "page://5?_language=0"),
        ]
    );
    assert_eq!(
        ctx.location("https://www.example.com/sub-folder/dummy-1-2").await.as_deref(),
        Some("https://www.example.com/sub-folder/test-new")
    );
}

fn multilingual_pages() -> Vec<PageRecord> {
    let mut pages = example_tree();
    let page_2 = pages[1].clone();
    let page_5 = pages[3].clone();
    pages.push(PageRecord::translation_of(&page_2, 21, 1, "dummy-1-2-de"));
    pages.push(PageRecord::translation_of(&page_5, 51, 1, "dummy-1-2-5-de"));
    pages.push(PageRecord::translation_of(&page_2, 22, 2, "dummy-1-2-fr"));
    pages
}

fn multilingual_site() -> TestContext {
    TestContext::builder()
        .site(site(
            "main",
            1,
            "https://www.example.com/",
            vec![
                language(0, "/"),
                language(1, "/de/"),
                language(2, "https://fr.example.com/"),
            ],
        ))
        .pages(multilingual_pages())
        .build()
}

#[tokio::test]
async fn test_renaming_default_record_leaves_translations_alone() {
    let ctx = multilingual_site();

    ctx.state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/dummy-1-2", "page://2?_language=0"),
            rule(HOST, "/dummy-1-2/dummy-1-2-5", "page://5?_language=0"),
        ]
    );
}

#[tokio::test]
async fn test_renaming_translation_with_relative_language_base() {
    let ctx = multilingual_site();

    ctx.state.slug_service.rename_page(21, "neu").await.unwrap();

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/de/dummy-1-2-de", "page://2?_language=1"),
            rule(HOST, "/de/dummy-1-2-de/dummy-1-2-5-de", "page://5?_language=1"),
        ]
    );
    assert_eq!(
        ctx.location("https://www.example.com/de/dummy-1-2-de").await.as_deref(),
        Some("https://www.example.com/de/neu")
    );
    assert_eq!(
        ctx.location("https://www.example.com/de/dummy-1-2-de/dummy-1-2-5-de")
            .await
            .as_deref(),
        Some("https://www.example.com/de/neu/dummy-1-2-5-de")
    );
}

#[tokio::test]
async fn test_renaming_translation_with_own_host() {
    let ctx = multilingual_site();

    ctx.state
        .slug_service
        .rename_page(22, "nouveau")
        .await
        .unwrap();

    // Page 5 has no French version, so only page 2 gets a redirect.
    assert_eq!(
        live_rules(&ctx.store).await,
        vec![rule("fr.example.com", "/dummy-1-2-fr", "page://2?_language=2")]
    );
    assert_eq!(
        ctx.location("https://fr.example.com/dummy-1-2-fr").await.as_deref(),
        Some("https://fr.example.com/nouveau")
    );
    assert_eq!(ctx.location("https://www.example.com/dummy-1-2-fr").await, None);
}

#[tokio::test]
async fn test_renaming_translated_site_root() {
    let mut pages = multilingual_pages();
    let root = pages[0].clone();
    pages.push(PageRecord::translation_of(&root, 11, 1, ""));

    let ctx = TestContext::builder()
        .site(site(
            "main",
            1,
            "https://www.example.com/",
            vec![language(0, "/"), language(1, "/de/")],
        ))
        .pages(pages)
        .build();

    ctx.state.slug_service.rename_page(11, "start").await.unwrap();

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/de/", "page://1?_language=1"),
            rule(HOST, "/de/dummy-1-2-de", "page://2?_language=1"),
            rule(HOST, "/de/dummy-1-2-de/dummy-1-2-5-de", "page://5?_language=1"),
        ]
    );
}

#[tokio::test]
async fn test_renaming_site_root_covers_the_whole_tree() {
    let ctx = TestContext::example();

    ctx.state.slug_service.rename_page(1, "home").await.unwrap();

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/", "page://1?_language=0"),
            rule(HOST, "/dummy-1-2", "page://2?_language=0"),
            rule(HOST, "/dummy-1-3", "page://3?_language=0"),
            rule(HOST, "/dummy-1-2/dummy-1-2-5", "page://5?_language=0"),
        ]
    );
    assert_eq!(
        ctx.location("https://www.example.com/").await.as_deref(),
        Some("https://www.example.com/home")
    );
}

async fn rename_with(pages: Vec<PageRecord>) -> TestContext {
    let ctx = TestContext::builder()
        .site(example_site())
        .pages(pages)
        .build();
    ctx.state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();
    ctx
}

#[tokio::test]
async fn test_folders_and_spacers_get_no_redirect_but_their_children_do() {
    for page_type in [PageType::Folder, PageType::Spacer] {
        let mut pages = example_tree();
        pages[1].page_type = page_type;

        let ctx = rename_with(pages).await;

        assert_eq!(
            live_rules(&ctx.store).await,
            vec![rule(HOST, "/dummy-1-2/dummy-1-2-5", "page://5?_language=0")],
            "{page_type:?}"
        );
    }
}

#[tokio::test]
async fn test_hidden_page_without_subpage_inheritance() {
    let mut pages = example_tree();
    pages[1].hidden = true;

    let ctx = rename_with(pages).await;

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![rule(HOST, "/dummy-1-2/dummy-1-2-5", "page://5?_language=0")]
    );
}

#[tokio::test]
async fn test_hidden_or_scheduled_page_extending_to_subpages() {
    let now = chrono::Utc::now();

    let mut hidden = example_tree();
    hidden[1].hidden = true;
    hidden[1].extend_to_subpages = true;

    let mut not_started = example_tree();
    not_started[1].starts_at = Some(now + chrono::Duration::days(1));
    not_started[1].extend_to_subpages = true;

    for pages in [hidden, not_started] {
        let ctx = rename_with(pages).await;
        assert!(live_rules(&ctx.store).await.is_empty());
    }
}

#[tokio::test]
async fn test_expired_subpage_is_skipped() {
    let mut pages = example_tree();
    pages[3].ends_at = Some(chrono::Utc::now() - chrono::Duration::days(1));

    let ctx = rename_with(pages).await;

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![rule(HOST, "/dummy-1-2", "page://2?_language=0")]
    );
}

#[tokio::test]
async fn test_route_suffix_is_appended_once() {
    let mut with_suffix = example_site();
    with_suffix.route_suffix = Some("/".to_string());
    let ctx = TestContext::builder()
        .site(with_suffix)
        .pages(example_tree())
        .build();

    ctx.state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/dummy-1-2/", "page://2?_language=0"),
            rule(HOST, "/dummy-1-2/dummy-1-2-5/", "page://5?_language=0"),
        ]
    );
    assert_eq!(
        ctx.location("https://www.example.com/dummy-1-2/").await.as_deref(),
        Some("https://www.example.com/test-new/")
    );
    assert_eq!(
        ctx.location("https://www.example.com/dummy-1-2").await.as_deref(),
        Some("https://www.example.com/test-new/")
    );
}

#[tokio::test]
async fn test_site_settings_control_creation() {
    let mut disabled = example_site();
    disabled.redirects.auto_create = false;
    let ctx = TestContext::builder()
        .site(disabled)
        .pages(example_tree())
        .build();

    let result = ctx
        .state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();
    assert_eq!(result.page.slug, "test-new");
    assert!(live_rules(&ctx.store).await.is_empty());

    let mut permanent = example_site();
    permanent.redirects.http_status_code = 301;
    let ctx = TestContext::builder()
        .site(permanent)
        .pages(example_tree())
        .build();

    let result = ctx
        .state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();
    assert!(result.outcome.created.iter().all(|r| r.status_code == 301));
}

#[tokio::test]
async fn test_double_rename_keeps_old_urls_working() {
    let ctx = TestContext::example();

    ctx.state.slug_service.rename_page(2, "first").await.unwrap();
    ctx.state.slug_service.rename_page(2, "second").await.unwrap();

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/dummy-1-2", "page://2?_language=0"),
            rule(HOST, "/dummy-1-2/dummy-1-2-5", "page://5?_language=0"),
            rule(HOST, "/first", "page://2?_language=0"),
            rule(HOST, "/first/dummy-1-2-5", "page://5?_language=0"),
        ]
    );
    for old in ["/dummy-1-2", "/first"] {
        assert_eq!(
            ctx.location(&format!("https://www.example.com{old}")).await.as_deref(),
            Some("https://www.example.com/second")
        );
    }
}

#[tokio::test]
async fn test_renaming_back_removes_shadowing_redirects() {
    let ctx = TestContext::example();

    ctx.state.slug_service.rename_page(2, "moved").await.unwrap();
    let result = ctx
        .state
        .slug_service
        .rename_page(2, "dummy-1-2")
        .await
        .unwrap();

    assert_eq!(result.outcome.removed, vec![1, 2]);
    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/moved", "page://2?_language=0"),
            rule(HOST, "/moved/dummy-1-2-5", "page://5?_language=0"),
        ]
    );
    assert_eq!(ctx.location("https://www.example.com/dummy-1-2").await, None);
    assert_eq!(
        ctx.location("https://www.example.com/moved").await.as_deref(),
        Some("https://www.example.com/dummy-1-2")
    );
}

async fn set_hidden(ctx: &TestContext, record_id: i64, hidden: bool) {
    let mut page = ctx
        .store
        .pages()
        .await
        .into_iter()
        .find(|p| p.id == record_id)
        .unwrap();
    page.hidden = hidden;
    ctx.store.upsert_page(page).await;
}

#[tokio::test]
async fn test_renaming_hidden_page_back_clears_its_old_redirect() {
    let ctx = TestContext::example();

    ctx.state.slug_service.rename_page(2, "moved").await.unwrap();
    set_hidden(&ctx, 2, true).await;
    let result = ctx
        .state
        .slug_service
        .rename_page(2, "dummy-1-2")
        .await
        .unwrap();
    set_hidden(&ctx, 2, false).await;

    assert_eq!(result.outcome.removed, vec![1, 2]);
    assert_eq!(
        live_rules(&ctx.store).await,
        vec![rule(HOST, "/moved/dummy-1-2-5", "page://5?_language=0")]
    );
    assert_eq!(ctx.location("https://www.example.com/dummy-1-2").await, None);
    assert_eq!(
        ctx.location("https://www.example.com/moved/dummy-1-2-5").await.as_deref(),
        Some("https://www.example.com/dummy-1-2/dummy-1-2-5")
    );
}

fn capitalized_tree() -> Vec<PageRecord> {
    let mut pages = example_tree();
    pages[1].slug = "About".to_string();
    pages
}

#[tokio::test]
async fn test_case_only_rename_with_case_insensitive_matching() {
    let ctx = TestContext::builder()
        .site(example_site())
        .pages(capitalized_tree())
        .case_insensitive(true)
        .build();

    let result = ctx.state.slug_service.rename_page(2, "about").await.unwrap();

    assert!(result.outcome.created.is_empty());
    assert!(live_rules(&ctx.store).await.is_empty());
    assert_eq!(ctx.location("https://www.example.com/about").await, None);
    assert_eq!(ctx.location("https://www.example.com/About/dummy-1-2-5").await, None);
}

#[tokio::test]
async fn test_case_only_rename_keeps_redirect_when_matching_is_case_sensitive() {
    let ctx = TestContext::builder()
        .site(example_site())
        .pages(capitalized_tree())
        .build();

    ctx.state.slug_service.rename_page(2, "about").await.unwrap();

    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/About", "page://2?_language=0"),
            rule(HOST, "/About/dummy-1-2-5", "page://5?_language=0"),
        ]
    );
    assert_eq!(
        ctx.location("https://www.example.com/About").await.as_deref(),
        Some("https://www.example.com/about")
    );
    assert_eq!(ctx.location("https://www.example.com/about").await, None);
}

#[tokio::test]
async fn test_renaming_back_in_other_case_clears_redirects() {
    let ctx = TestContext::builder()
        .site(example_site())
        .pages(capitalized_tree())
        .case_insensitive(true)
        .build();

    ctx.state.slug_service.rename_page(2, "moved").await.unwrap();
    let result = ctx.state.slug_service.rename_page(2, "about").await.unwrap();

    assert_eq!(result.outcome.removed, vec![1, 2]);
    assert_eq!(ctx.location("https://www.example.com/about").await, None);
    assert_eq!(
        ctx.location("https://www.example.com/moved").await.as_deref(),
        Some("https://www.example.com/about")
    );
}

#[tokio::test]
async fn test_manual_and_protected_rules_are_not_touched() {
    let ctx = TestContext::example();
    let manual = ctx
        .store
        .create(NewRedirect::manual(HOST, "/dummy-1-2", "https://other.example/"))
        .await
        .unwrap();
    let protected = ctx
        .store
        .create(NewRedirect {
            creation_type: CreationType::AutoCreated,
            protected: true,
            ..NewRedirect::manual(HOST, "/dummy-1-2/dummy-1-2-5", "/kept")
        })
        .await
        .unwrap();

    let result = ctx
        .state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();

    assert!(result.outcome.created.is_empty());
    assert!(result.outcome.updated.is_empty());
    assert_eq!(result.outcome.skipped.len(), 2);
    assert_eq!(
        live_rules(&ctx.store).await,
        vec![
            rule(HOST, "/dummy-1-2", "https://other.example/"),
            rule(HOST, "/dummy-1-2/dummy-1-2-5", "/kept"),
        ]
    );
    assert_eq!(ctx.store.find_by_id(manual.id).await.unwrap(), Some(manual));
    assert_eq!(ctx.store.find_by_id(protected.id).await.unwrap(), Some(protected));
}

#[tokio::test]
async fn test_existing_automatic_rule_is_updated() {
    let ctx = TestContext::example();
    let previous = ctx
        .store
        .create(NewRedirect {
            creation_type: CreationType::AutoCreated,
            ..NewRedirect::manual(HOST, "/dummy-1-2", "page://3?_language=0")
        })
        .await
        .unwrap();

    let result = ctx
        .state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();

    assert_eq!(result.outcome.updated.len(), 1);
    assert_eq!(result.outcome.updated[0].id, previous.id);
    assert_eq!(result.outcome.updated[0].target, "page://2?_language=0");
    assert_eq!(
        result.outcome.updated[0].correlation_id,
        result.correlation_id.as_ref().map(|id| id.to_string())
    );
    assert_eq!(result.outcome.created.len(), 1);
    assert_eq!(live_rules(&ctx.store).await.len(), 2);
}

struct PermanentStatus;

#[async_trait]
impl PreRedirectPersist for PermanentStatus {
    async fn before_persist(
        &self,
        _change: &SlugChangeItem,
        mut candidate: RedirectCandidate,
    ) -> Result<RedirectCandidate, AppError> {
        candidate.status_code = 301;
        Ok(candidate)
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(i64, i64)>>);

#[async_trait]
impl PostRedirectPersist for Recorder {
    async fn after_persist(
        &self,
        change: &SlugChangeItem,
        redirect: &Redirect,
    ) -> Result<(), AppError> {
        self.0.lock().unwrap().push((change.record_id(), redirect.id));
        Ok(())
    }
}

struct Reject;

#[async_trait]
impl PostRedirectPersist for Reject {
    async fn after_persist(
        &self,
        _change: &SlugChangeItem,
        redirect: &Redirect,
    ) -> Result<(), AppError> {
        Err(AppError::conflict(
            "Rejected by hook",
            json!({ "source_path": redirect.source_path }),
        ))
    }
}

#[tokio::test]
async fn test_persist_hooks_see_every_redirect() {
    let recorder = Arc::new(Recorder::default());
    let ctx = TestContext::builder()
        .site(example_site())
        .pages(example_tree())
        .hooks(
            RedirectPersistHooks::new()
                .with_pre(Arc::new(PermanentStatus))
                .with_post(recorder.clone()),
        )
        .build();

    let result = ctx
        .state
        .slug_service
        .rename_page(2, "test-new")
        .await
        .unwrap();

    assert!(result.outcome.created.iter().all(|r| r.status_code == 301));
    assert_eq!(*recorder.0.lock().unwrap(), vec![(2, 1), (2, 2)]);
}

#[tokio::test]
async fn test_hook_failure_rolls_back_the_rename() {
    let ctx = TestContext::builder()
        .site(example_site())
        .pages(example_tree())
        .hooks(RedirectPersistHooks::new().with_post(Arc::new(Reject)))
        .build();

    let result = ctx.state.slug_service.rename_page(2, "test-new").await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
    assert!(ctx.store.redirects().await.is_empty());
    let page = ctx
        .store
        .pages()
        .await
        .into_iter()
        .find(|p| p.id == 2)
        .unwrap();
    assert_eq!(page.slug, "dummy-1-2");
}
