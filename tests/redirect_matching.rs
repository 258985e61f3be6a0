mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{HOST, TestContext, example_site, example_tree};
use slug_redirects::application::services::RequestContext;
use slug_redirects::domain::entities::{ANY_HOST, FrontendUser, NewRedirect, Redirect, RedirectPatch};
use slug_redirects::domain::repositories::RedirectRepository;
use url::Url;

async fn add(ctx: &TestContext, redirect: NewRedirect) -> Redirect {
    ctx.store.create(redirect).await.unwrap()
}

#[tokio::test]
async fn test_host_specific_rule_wins_over_wildcard() {
    let ctx = TestContext::example();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/old", "https://any.example/")).await;
    add(&ctx, NewRedirect::manual(HOST, "/old", "https://host.example/")).await;

    assert_eq!(
        ctx.location("https://www.example.com/old").await.as_deref(),
        Some("https://host.example/")
    );
    assert_eq!(
        ctx.location("https://other.example.org/old").await.as_deref(),
        Some("https://any.example/")
    );
}

#[tokio::test]
async fn test_exact_path_wins_over_regex() {
    let ctx = TestContext::example();
    add(
        &ctx,
        NewRedirect::manual(ANY_HOST, "#^/old.*#", "https://regex.example/").regex(),
    )
    .await;
    add(&ctx, NewRedirect::manual(ANY_HOST, "/old", "https://exact.example/")).await;

    assert_eq!(
        ctx.location("https://www.example.com/old").await.as_deref(),
        Some("https://exact.example/")
    );
    assert_eq!(
        ctx.location("https://www.example.com/older").await.as_deref(),
        Some("https://regex.example/")
    );
}

#[tokio::test]
async fn test_lowest_id_wins_among_equals() {
    let ctx = TestContext::example();
    let first = add(&ctx, NewRedirect::manual(ANY_HOST, "/dup", "https://first.example/")).await;
    add(&ctx, NewRedirect::manual(ANY_HOST, "/dup", "https://second.example/")).await;

    let resolved = ctx.evaluate("https://www.example.com/dup").await.unwrap();
    assert_eq!(resolved.redirect.id, first.id);
}

#[tokio::test]
async fn test_regex_captures_are_substituted() {
    let ctx = TestContext::example();
    add(
        &ctx,
        NewRedirect::manual(
            ANY_HOST,
            r"#^/blog/(\d+)/(.*)$#",
            "https://news.example/articles/$1?slug=$2",
        )
        .regex(),
    )
    .await;

    assert_eq!(
        ctx.location("https://www.example.com/blog/42/hello").await.as_deref(),
        Some("https://news.example/articles/42?slug=hello")
    );
    assert_eq!(ctx.location("https://www.example.com/blog/x/hello").await, None);
}

#[tokio::test]
async fn test_invalid_regex_is_skipped() {
    let ctx = TestContext::example();
    add(
        &ctx,
        NewRedirect::manual(ANY_HOST, "#(unclosed#", "https://broken.example/").regex(),
    )
    .await;
    add(&ctx, NewRedirect::manual(ANY_HOST, "/fine", "https://fine.example/")).await;

    assert_eq!(ctx.location("https://www.example.com/(unclosed").await, None);
    assert_eq!(
        ctx.location("https://www.example.com/fine").await.as_deref(),
        Some("https://fine.example/")
    );
}

#[tokio::test]
async fn test_query_aware_rules() {
    let ctx = TestContext::example();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/search", "https://plain.example/")).await;
    add(
        &ctx,
        NewRedirect::manual(ANY_HOST, "/search?q=rust&page=1", "https://rust.example/")
            .respecting_query(),
    )
    .await;

    // Parameter order does not matter; request parameters are carried over.
    assert_eq!(
        ctx.location("https://www.example.com/search?page=1&q=rust").await.as_deref(),
        Some("https://rust.example/?page=1&q=rust")
    );
    assert_eq!(
        ctx.location("https://www.example.com/search?q=go").await.as_deref(),
        Some("https://plain.example/?q=go")
    );
}

#[tokio::test]
async fn test_target_parameters_override_request_parameters() {
    let ctx = TestContext::example();
    add(
        &ctx,
        NewRedirect::manual(ANY_HOST, "/campaign", "https://shop.example/?utm=target"),
    )
    .await;

    assert_eq!(
        ctx.location("https://www.example.com/campaign?utm=request&ref=mail")
            .await
            .as_deref(),
        Some("https://shop.example/?ref=mail&utm=target")
    );
}

#[tokio::test]
async fn test_trailing_slash_and_case() {
    let ctx = TestContext::example();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/Old-Page/", "https://new.example/")).await;

    assert!(ctx.location("https://www.example.com/Old-Page").await.is_some());
    assert_eq!(ctx.location("https://www.example.com/old-page").await, None);

    let ctx = TestContext::builder()
        .site(example_site())
        .pages(example_tree())
        .case_insensitive(true)
        .build();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/Old-Page/", "https://new.example/")).await;
    assert!(ctx.location("https://www.example.com/old-page").await.is_some());
}

#[tokio::test]
async fn test_disabled_deleted_and_scheduled_rules_never_match() {
    let ctx = TestContext::example();
    let disabled = add(&ctx, NewRedirect::manual(ANY_HOST, "/disabled", "https://x.example/")).await;
    ctx.store
        .update(
            disabled.id,
            RedirectPatch {
                disabled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let deleted = add(&ctx, NewRedirect::manual(ANY_HOST, "/deleted", "https://x.example/")).await;
    assert!(ctx.store.soft_delete(deleted.id).await.unwrap());

    add(
        &ctx,
        NewRedirect {
            starts_at: Some(Utc::now() + Duration::days(1)),
            ..NewRedirect::manual(ANY_HOST, "/later", "https://x.example/")
        },
    )
    .await;
    add(
        &ctx,
        NewRedirect {
            ends_at: Some(Utc::now() - Duration::days(1)),
            ..NewRedirect::manual(ANY_HOST, "/over", "https://x.example/")
        },
    )
    .await;

    for path in ["/disabled", "/deleted", "/later", "/over"] {
        assert_eq!(
            ctx.location(&format!("https://www.example.com{path}")).await,
            None,
            "{path}"
        );
    }
}

#[tokio::test]
async fn test_internal_and_relative_targets() {
    let ctx = TestContext::example();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/to-page", "page://5?_language=0&tab=info")).await;
    add(&ctx, NewRedirect::manual(ANY_HOST, "/to-path", "/somewhere/else")).await;

    assert_eq!(
        ctx.location("https://www.example.com/to-page").await.as_deref(),
        Some("https://www.example.com/dummy-1-2/dummy-1-2-5?tab=info")
    );
    assert_eq!(
        ctx.location("http://localhost:8080/to-path?x=1").await.as_deref(),
        Some("http://localhost:8080/somewhere/else?x=1")
    );
}

#[tokio::test]
async fn test_unresolvable_target_falls_through() {
    let ctx = TestContext::example();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/gone", "page://99")).await;
    add(&ctx, NewRedirect::manual(ANY_HOST, "/gone", "https://later.example/")).await;
    add(&ctx, NewRedirect::manual(ANY_HOST, "/garbage", "ftp://files.example/")).await;

    assert_eq!(ctx.location("https://www.example.com/gone").await, None);
    assert_eq!(ctx.location("https://www.example.com/garbage").await, None);
}

#[tokio::test]
async fn test_target_page_hidden_later_falls_through() {
    let ctx = TestContext::example();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/to-three", "page://3")).await;
    assert!(ctx.location("https://www.example.com/to-three").await.is_some());

    let mut hidden = example_tree()[2].clone();
    hidden.hidden = true;
    ctx.store.upsert_page(hidden).await;

    assert_eq!(ctx.location("https://www.example.com/to-three").await, None);
}

#[tokio::test]
async fn test_protected_page_needs_matching_frontend_group() {
    let mut pages = example_tree();
    pages[2].access_groups = vec![7];
    let ctx = TestContext::builder()
        .site(example_site())
        .pages(pages)
        .build();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/members", "page://3")).await;

    let url = Url::parse("https://www.example.com/members").unwrap();
    let anonymous = RequestContext::new(url.clone());
    let member = RequestContext::new(url).with_user(Some(FrontendUser {
        id: 1,
        groups: vec![7],
    }));

    let engine = &ctx.state.engine;
    assert!(engine.evaluate(HOST, "/members", "", &anonymous).await.is_none());
    let resolved = engine.evaluate(HOST, "/members", "", &member).await.unwrap();
    assert_eq!(resolved.location.as_str(), "https://www.example.com/dummy-1-3");
}

#[tokio::test]
async fn test_status_codes() {
    let ctx = TestContext::example();
    add(
        &ctx,
        NewRedirect::manual(ANY_HOST, "/moved", "https://x.example/").with_status_code(301),
    )
    .await;
    add(
        &ctx,
        NewRedirect::manual(ANY_HOST, "/odd", "https://x.example/").with_status_code(200),
    )
    .await;

    let moved = ctx.evaluate("https://www.example.com/moved").await.unwrap();
    assert_eq!(moved.status, StatusCode::MOVED_PERMANENTLY);

    let odd = ctx.evaluate("https://www.example.com/odd").await.unwrap();
    assert_eq!(odd.status, StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_rule_pointing_at_requested_url_falls_through() {
    let ctx = TestContext::example();
    add(&ctx, NewRedirect::manual(ANY_HOST, "/loop", "/loop")).await;
    add(&ctx, NewRedirect::manual(HOST, "/dummy-1-2", "page://2")).await;

    assert_eq!(ctx.location("https://www.example.com/loop").await, None);
    assert_eq!(ctx.location("https://www.example.com/loop?a=1").await, None);
    assert_eq!(ctx.location("https://www.example.com/dummy-1-2").await, None);
    assert_eq!(
        ctx.location("https://www.example.com/dummy-1-2/").await.as_deref(),
        Some("https://www.example.com/dummy-1-2")
    );
}
