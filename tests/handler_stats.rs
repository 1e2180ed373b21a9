mod common;

use chrono::{Duration, Utc};
use shortspan::infrastructure::cache::LinkCache;

#[tokio::test]
async fn test_stats_success() {
    let ctx = common::create_test_state();

    let mut link = common::sample_link(
        ctx.repo.next_id(),
        "stats1",
        "https://example.com/page",
        ctx.user_id,
    );
    link.redirect_count = 5;
    link.last_used = Some(Utc::now() - Duration::hours(2));
    ctx.repo.seed(link);

    let server = common::test_server(ctx.state);
    let response = server
        .get("/api/links/stats1/stats")
        .add_header("Authorization", common::bearer())
        .await;

    response.assert_status_ok();

    let body = response.json::<serde_json::Value>();
    assert_eq!(body["original_url"], "https://example.com/page");
    assert_eq!(body["redirect_count"], 5);
    assert!(body["created_at"].is_string());
    assert!(body["last_used"].is_string());
}

#[tokio::test]
async fn test_stats_never_visited_link() {
    let ctx = common::create_test_state();
    common::create_test_link(&ctx, "quiet1", "https://example.com");

    let server = common::test_server(ctx.state);
    let response = server
        .get("/api/links/quiet1/stats")
        .add_header("Authorization", common::bearer())
        .await;

    response.assert_status_ok();

    let body = response.json::<serde_json::Value>();
    assert_eq!(body["redirect_count"], 0);
    assert!(body["last_used"].is_null());
}

#[tokio::test]
async fn test_stats_prefers_cache_counters() {
    let ctx = common::create_test_state();

    // Store says 7 hits; the cache record was created after the last
    // reconciliation and carries the current total of 2.
    let mut link = common::sample_link(
        ctx.repo.next_id(),
        "drift1",
        "https://example.com",
        ctx.user_id,
    );
    link.redirect_count = 7;
    link.last_used = Some(Utc::now() - Duration::days(3));
    ctx.repo.seed(link);

    ctx.cache.record_hit("drift1").await.unwrap();
    ctx.cache.record_hit("drift1").await.unwrap();

    let server = common::test_server(ctx.state);
    let response = server
        .get("/api/links/drift1/stats")
        .add_header("Authorization", common::bearer())
        .await;

    response.assert_status_ok();

    let body = response.json::<serde_json::Value>();
    assert_eq!(body["redirect_count"], 2);
}

#[tokio::test]
async fn test_stats_sees_hits_before_any_write_back() {
    let ctx = common::create_test_state();
    common::create_test_link(&ctx, "fresh1", "https://example.com");

    let server = common::test_server(ctx.state.clone());

    for _ in 0..3 {
        server
            .get("/fresh1")
            .await
            .assert_status(axum::http::StatusCode::TEMPORARY_REDIRECT);
    }
    common::wait_for_hit_count(&ctx, "fresh1", 3).await;

    let response = server
        .get("/api/links/fresh1/stats")
        .add_header("Authorization", common::bearer())
        .await;

    response.assert_status_ok();

    let body = response.json::<serde_json::Value>();
    assert_eq!(body["redirect_count"], 3);
    assert!(body["last_used"].is_string());

    // The store row has not been written back yet.
    assert_eq!(ctx.repo.get("fresh1").unwrap().redirect_count, 0);
}

#[tokio::test]
async fn test_stats_not_found() {
    let ctx = common::create_test_state();
    let server = common::test_server(ctx.state);

    let response = server
        .get("/api/links/ghost2/stats")
        .add_header("Authorization", common::bearer())
        .await;

    response.assert_status_not_found();

    let body = response.json::<serde_json::Value>();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_stats_foreign_link_forbidden() {
    let ctx = common::create_test_state();
    common::create_foreign_link(&ctx, "their2", "https://example.com");

    let server = common::test_server(ctx.state);
    let response = server
        .get("/api/links/their2/stats")
        .add_header("Authorization", common::bearer())
        .await;

    response.assert_status_forbidden();
}
