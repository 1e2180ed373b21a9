mod common;

use std::time::Duration;

use chrono::Utc;
use shortspan::application::reconciler::StatsReconciler;
use shortspan::infrastructure::cache::LinkCache;
use tokio::sync::watch;

fn make_reconciler(ctx: &common::TestContext, interval: Duration) -> StatsReconciler {
    StatsReconciler::new(ctx.repo.clone(), ctx.cache.clone(), interval)
}

#[tokio::test]
async fn test_pass_writes_cache_counters_to_store() {
    let ctx = common::create_test_state();
    common::create_test_link(&ctx, "sync01", "https://example.com/a");
    common::create_test_link(&ctx, "sync02", "https://example.com/b");

    for _ in 0..3 {
        ctx.cache.record_hit("sync01").await.unwrap();
    }
    ctx.cache.record_hit("sync02").await.unwrap();

    let reconciler = make_reconciler(&ctx, Duration::from_secs(60));
    let summary = reconciler.run_once().await.unwrap();

    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.updated, 2);
    assert_eq!(summary.skipped, 0);

    let first = ctx.repo.get("sync01").unwrap();
    assert_eq!(first.redirect_count, 3);
    assert!(first.last_used.is_some());

    let second = ctx.repo.get("sync02").unwrap();
    assert_eq!(second.redirect_count, 1);
}

#[tokio::test]
async fn test_pass_is_idempotent_until_new_hits_arrive() {
    let ctx = common::create_test_state();
    common::create_test_link(&ctx, "idem01", "https://example.com");
    ctx.cache.record_hit("idem01").await.unwrap();

    let reconciler = make_reconciler(&ctx, Duration::from_secs(60));

    let first = reconciler.run_once().await.unwrap();
    assert_eq!(first.updated, 1);

    // Nothing changed since the last pass, so nothing is written.
    let second = reconciler.run_once().await.unwrap();
    assert_eq!(second.updated, 0);

    // A new hit makes the next pass write again.
    ctx.cache.record_hit("idem01").await.unwrap();
    let third = reconciler.run_once().await.unwrap();
    assert_eq!(third.updated, 1);
    assert_eq!(ctx.repo.get("idem01").unwrap().redirect_count, 2);
}

#[tokio::test]
async fn test_pass_overwrites_even_when_cache_count_is_lower() {
    let ctx = common::create_test_state();

    // Store remembers 50 hits; the cache record restarted from zero and has
    // seen 2 since. The cache total wins regardless.
    let mut link = common::sample_link(
        ctx.repo.next_id(),
        "lower1",
        "https://example.com",
        ctx.user_id,
    );
    link.redirect_count = 50;
    ctx.repo.seed(link);

    ctx.cache.record_hit("lower1").await.unwrap();
    ctx.cache.record_hit("lower1").await.unwrap();

    let reconciler = make_reconciler(&ctx, Duration::from_secs(60));
    reconciler.run_once().await.unwrap();

    assert_eq!(ctx.repo.get("lower1").unwrap().redirect_count, 2);
}

#[tokio::test]
async fn test_pass_skips_links_without_cache_stats() {
    let ctx = common::create_test_state();
    common::create_test_link(&ctx, "cold01", "https://example.com");

    let reconciler = make_reconciler(&ctx, Duration::from_secs(60));
    let summary = reconciler.run_once().await.unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.updated, 0);

    let stored = ctx.repo.get("cold01").unwrap();
    assert_eq!(stored.redirect_count, 0);
    assert!(stored.last_used.is_none());
}

#[tokio::test]
async fn test_pass_keeps_newer_store_timestamp() {
    let ctx = common::create_test_state();

    // The store already carries a last_used in the future of anything the
    // cache has seen; the max survives.
    let future = Utc::now() + chrono::Duration::hours(1);
    let mut link = common::sample_link(
        ctx.repo.next_id(),
        "ahead1",
        "https://example.com",
        ctx.user_id,
    );
    link.last_used = Some(future);
    ctx.repo.seed(link);

    ctx.cache.record_hit("ahead1").await.unwrap();

    let reconciler = make_reconciler(&ctx, Duration::from_secs(60));
    reconciler.run_once().await.unwrap();

    let stored = ctx.repo.get("ahead1").unwrap();
    assert_eq!(stored.redirect_count, 1);
    assert_eq!(stored.last_used, Some(future));
}

#[tokio::test]
async fn test_background_loop_runs_first_pass_immediately() {
    let ctx = common::create_test_state();
    common::create_test_link(&ctx, "loop01", "https://example.com");
    ctx.cache.record_hit("loop01").await.unwrap();

    // A long interval proves the first pass does not wait for a tick.
    let reconciler = make_reconciler(&ctx, Duration::from_secs(3600));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(reconciler.run(shutdown_rx));

    let mut synced = false;
    for _ in 0..100 {
        if ctx.repo.get("loop01").unwrap().redirect_count == 1 {
            synced = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(synced, "first pass never reached the store");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("reconciler did not stop on shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_background_loop_keeps_store_converged() {
    let ctx = common::create_test_state();
    common::create_test_link(&ctx, "loop02", "https://example.com");

    let reconciler = make_reconciler(&ctx, Duration::from_millis(20));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(reconciler.run(shutdown_rx));

    for _ in 0..4 {
        ctx.cache.record_hit("loop02").await.unwrap();
    }

    let mut converged = false;
    for _ in 0..100 {
        if ctx.repo.get("loop02").unwrap().redirect_count == 4 {
            converged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(converged, "store never caught up with the cache");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("reconciler did not stop on shutdown")
        .unwrap();
}
